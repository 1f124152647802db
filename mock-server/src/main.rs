use tokio::net::TcpListener;

/// Serve the document store on `HOST:PORT` until interrupted.
#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let addr = mock_server::bind_address(|key| std::env::var(key).ok());
    let listener = TcpListener::bind(&addr).await?;
    let local = listener.local_addr()?;
    println!("mock document server on http://{local}");
    println!("  collections: /{{collection}}[/{{id}}]  singleton: /settings  statuses: /status/{{code}}");
    mock_server::run(listener).await
}
