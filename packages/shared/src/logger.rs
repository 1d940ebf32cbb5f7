//! Logging setup for the Colony binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Crates whose logs are enabled by default besides the binary itself.
const WORKSPACE_CRATES: &[&str] = &["colony_shared", "colony_server", "colony_worker"];

/// Build the default filter directive, e.g. `colony_server=debug,colony-server=debug`.
fn default_directive(binary_name: &str, default_log_level: &str) -> String {
    let mut targets: Vec<String> = WORKSPACE_CRATES
        .iter()
        .map(|krate| format!("{}={}", krate, default_log_level))
        .collect();
    targets.push(format!(
        "{}={}",
        binary_name.replace('-', "_"),
        default_log_level
    ));
    targets.push(format!("tower_http={}", default_log_level));
    targets.join(",")
}

/// Initialize the tracing subscriber with the specified default log level.
///
/// The level can be overridden with the `RUST_LOG` environment variable.
///
/// # Examples
///
/// ```no_run
/// use colony_shared::logger::setup_logger;
///
/// setup_logger("colony-server", "debug");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directive(binary_name, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive_covers_workspace_and_binary() {
        // テスト項目: デフォルトのフィルタがワークスペースのクレートとバイナリを含む
        // given (前提条件):
        let binary = "colony-server";

        // when (操作):
        let directive = default_directive(binary, "info");

        // then (期待する結果):
        assert!(directive.contains("colony_server=info"));
        assert!(directive.contains("colony_worker=info"));
        assert!(directive.contains("tower_http=info"));
        assert!(directive.ends_with("colony_server=info,tower_http=info"));
    }
}
