// Bootstraps a throwaway server per test on an ephemeral port, following
// the teacher's ephemeral-port integration-test idiom. Unlike a shared
// global server, each scenario here needs its own fresh `GameCore`, so
// every call binds a brand new listener instead of reusing one.

use std::path::PathBuf;
use std::time::Duration;

use server::frameworks::config::Config;
use server::use_cases::SpawnConfig;

/// Spawns the server against the named fixture under `tests/fixtures/`
/// and returns its `ws://.../ws` base URL once the listener is bound.
pub async fn spawn_server(fixture: &str, clear_radius: i32, broadcast_interval: Duration) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral test port");
    let addr = listener.local_addr().expect("local addr");

    let config = Config {
        host: "127.0.0.1".to_string(),
        port: addr.port(),
        board_path: PathBuf::from(format!("tests/fixtures/{fixture}/board.json")),
        spawn: SpawnConfig {
            max_count: 25,
            clear_radius,
            wait_message: "Waiting for a free spawn point...".to_string(),
        },
        broadcast_interval,
    };

    tokio::spawn(server::run(listener, config));

    format!("ws://{addr}/ws")
}
