use deepeq_collections::{BiDirectionalDeepMap, DeepSet, Options};
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "deepeq_canonical=debug,deepeq_collections=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let events = [
        json!({"event_type": "login", "principal": "Alice"}),
        json!({"principal": "alice", "event_type": "LOGIN"}),
        json!({"event_type": "logout", "principal": "alice"}),
    ];

    let unique = match DeepSet::from_values(events, &Options::new().with_case_insensitive(true)) {
        Ok(set) => set,
        Err(err) => {
            eprintln!("deduplication failed: {}", err);
            std::process::exit(1);
        }
    };
    for event in &unique {
        println!("{}", event);
    }

    let mut owners = BiDirectionalDeepMap::new();
    if let Err(err) = owners.insert("alice", json!({"device": 1})) {
        eprintln!("insert failed: {}", err);
        std::process::exit(1);
    }
    if let Err(err) = owners.insert("bob", json!({"device": 1})) {
        println!("rejected: {}", err);
    }
}
