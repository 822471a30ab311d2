use crate::server;
use crate::utils::{get_public_dir, get_upstream_base_url};

pub async fn run(port: u16) {
    println!("🚀 Starting sigmascope server on port {}", port);
    println!("🌐 Upstream: {}", get_upstream_base_url());
    println!("📁 Static frontend: {}", get_public_dir().display());
    println!();

    if let Err(e) = server::serve(port).await {
        eprintln!("❌ Server error: {}", e);
        std::process::exit(1);
    }
}
