use anyhow::Result;

pub mod inspect;
pub mod run;

#[allow(async_fn_in_trait)]
pub trait CliCommand {
    async fn execute(&self) -> Result<()>;
}

/// Milliseconds, or a dash when absent
pub(crate) fn format_millis(value: Option<i64>) -> String {
    match value {
        Some(ms) => format!("{ms}ms"),
        None => "-".to_string(),
    }
}
