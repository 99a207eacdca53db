use anyhow::Result;

/// The tracker runs all of its logic on one thread: tickers, the processing loop and file I/O.
pub fn single_thread_runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}
