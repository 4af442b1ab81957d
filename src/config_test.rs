use super::*;
use clap::{CommandFactory, FromArgMatches};

#[test]
fn explicit_flags_override_defaults() {
    let config = Config::try_parse_from([
        "cursorboard",
        "--host",
        "127.0.0.1",
        "--port",
        "8080",
        "--static-dir",
        "/srv/www",
        "--broadcast-interval-ms",
        "250",
    ])
    .unwrap();

    assert_eq!(config.bind_addr(), "127.0.0.1:8080".parse::<SocketAddr>().unwrap());
    assert_eq!(config.static_dir, PathBuf::from("/srv/www"));
    assert_eq!(config.broadcast_interval(), Duration::from_millis(250));
}

/// Parse as if none of the fallback environment variables were set.
fn parse_without_env(args: &[&str]) -> Result<Config, clap::Error> {
    let command = Config::command().mut_args(|arg| arg.env(Option::<&'static str>::None));
    let matches = command.try_get_matches_from(args)?;
    Config::from_arg_matches(&matches)
}

#[test]
fn defaults_are_port_4050_and_10ms() {
    let config = parse_without_env(&["cursorboard"]).unwrap();
    assert_eq!(config.bind_addr(), SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)));
    assert_eq!(config.static_dir, PathBuf::from("web/static"));
    assert_eq!(config.broadcast_interval(), Duration::from_millis(10));
}

#[test]
fn zero_broadcast_interval_is_rejected() {
    let result = Config::try_parse_from(["cursorboard", "--broadcast-interval-ms", "0"]);
    assert!(result.is_err());
}

#[test]
fn invalid_port_is_rejected() {
    assert!(Config::try_parse_from(["cursorboard", "--port", "70000"]).is_err());
    assert!(Config::try_parse_from(["cursorboard", "--port", "http"]).is_err());
}
