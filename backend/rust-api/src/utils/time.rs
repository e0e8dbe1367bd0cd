/// Renders seconds as `m:ss`, the way the countdown is shown to learners.
pub fn format_clock(total_seconds: u32) -> String {
    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}
