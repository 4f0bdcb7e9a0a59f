use std::time::Duration;

/// Get standard user agent string
pub fn get_user_agent() -> String {
    format!("snap-fetch/{}", env!("CARGO_PKG_VERSION"))
}

/// Build the client shared by the catalog provider and the downloader.
pub fn build_client(user_agent: &str, timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .build()
}
