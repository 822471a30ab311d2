#[tokio::main]
async fn main() {
    sigmascope::init_tracing();
    sigmascope::cli::run().await;
}
