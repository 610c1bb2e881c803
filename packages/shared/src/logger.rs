//! Logging setup utilities.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber with the specified default log level.
///
/// The filter covers both the library crate and the binary. It can be
/// overridden with the `RUST_LOG` environment variable.
///
/// # Arguments
///
/// * `crate_name` - The library crate whose events should be shown (e.g., "pairroom_server")
/// * `binary_name` - The name of the binary (e.g., "pairroom-server")
/// * `default_log_level` - The default log level (e.g., "debug", "info", "warn", "error")
///
/// # Examples
///
/// ```no_run
/// use pairroom_shared::logger::setup_logger;
///
/// setup_logger("pairroom_server", "pairroom-server", "debug");
/// ```
pub fn setup_logger(crate_name: &str, binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(crate_name, binary_name, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build the default `EnvFilter` directive string.
///
/// Cargo binary names use dashes while tracing targets use underscores.
fn default_filter(crate_name: &str, binary_name: &str, default_log_level: &str) -> String {
    format!(
        "{}={},{}={},tower_http={}",
        crate_name.replace('-', "_"),
        default_log_level,
        binary_name.replace('-', "_"),
        default_log_level,
        default_log_level
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_normalizes_names() {
        // テスト項目: クレート名・バイナリ名のダッシュがアンダースコアに変換される
        // given (前提条件):
        let crate_name = "pairroom-server";
        let binary_name = "pairroom-server";

        // when (操作):
        let filter = default_filter(crate_name, binary_name, "info");

        // then (期待する結果):
        assert_eq!(
            filter,
            "pairroom_server=info,pairroom_server=info,tower_http=info"
        );
    }
}
