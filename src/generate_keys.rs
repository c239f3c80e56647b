// generate_keys.rs
// Utility to generate fresh HS256 signing secrets for access and refresh tokens

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::{rngs::OsRng, RngCore};

fn generate_secret() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

fn main() {
    println!("Generating new token signing secrets...\n");

    // HS256 signs and verifies with the same secret
    let access = generate_secret();
    let refresh = generate_secret();

    println!("✅ Secrets generated successfully!\n");
    println!("Add these to your .env file:");
    println!("─────────────────────────────────────────────────");
    println!("TOKEN_SIGN_KEY={}", access);
    println!("TOKEN_VERIFY_KEY={}", access);
    println!("REFRESH_TOKEN_SIGN_KEY={}", refresh);
    println!("REFRESH_TOKEN_VERIFY_KEY={}", refresh);
    println!("─────────────────────────────────────────────────");
    println!("\n⚠️  IMPORTANT:");
    println!("  • Keep these secrets out of version control");
    println!("  • Rotating them invalidates every token already issued");
}
