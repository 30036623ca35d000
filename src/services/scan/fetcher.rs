use crate::core::error::AppResult;
use crate::core::events::{EventBus, LogLevel};
use crate::core::models::MessageSummary;
use crate::infrastructure::gmail::MailClient;
use crate::services::scan::CancelFlag;

/// Walk the paged list query and accumulate candidate message ids.
///
/// Pagination aborts early when the run is cancelled, returning whatever was
/// accumulated; downstream dedup keeps repeated runs correct. The list call
/// itself is never retried — any error aborts the fetch and surfaces as a
/// scan-level failure.
pub async fn fetch_candidates(
    client: &dyn MailClient,
    query: &str,
    page_size: u32,
    cancel: &CancelFlag,
    events: &EventBus,
) -> AppResult<Vec<MessageSummary>> {
    let mut page = client.list_messages(query, page_size, None).await?;
    let mut candidates = page.messages;

    while let Some(token) = page.next_page_token.take() {
        if cancel.is_cancelled() {
            events.log(LogLevel::Info, "Scan stopped during pagination");
            break;
        }
        events.log(LogLevel::Info, "Fetching next page of results...");
        page = client.list_messages(query, page_size, Some(&token)).await?;
        candidates.append(&mut page.messages);
    }

    Ok(candidates)
}
