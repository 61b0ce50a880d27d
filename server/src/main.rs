use std::path::PathBuf;

/// Parses the single `--board <path>` flag this binary accepts. No CLI
/// parsing crate is pulled in for this: one optional flag doesn't
/// justify the dependency, and the teacher's own binaries take zero
/// flags at all.
fn parse_board_flag(args: impl Iterator<Item = String>) -> Option<PathBuf> {
    let mut args = args.peekable();
    while let Some(arg) = args.next() {
        if arg == "--board" {
            return args.next().map(PathBuf::from);
        }
        if let Some(value) = arg.strip_prefix("--board=") {
            return Some(PathBuf::from(value));
        }
    }
    None
}

#[tokio::main]
async fn main() {
    let board_path = parse_board_flag(std::env::args().skip(1));

    if let Err(e) = server::run_with_config(board_path).await {
        tracing::error!(error = %e, "fatal error; exiting");
        std::process::exit(1);
    }
}
