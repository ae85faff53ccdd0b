use query_router::{QueryRouter, RouterConfig, Session, Turn};
use tracing::info;
use tracing_subscriber::EnvFilter;

const SAMPLE_UTTERANCES: &[&str] = &[
    "hello",
    "What is the price of $AAPL?",
    "Based on the crypto industry, how much will XRP be worth in 10 years",
    "How should we approach zero trust security architecture?",
    "We need to migrate our services to TLS 1.3",
    "Project revenue for $10000 at 8% growth",
    "how much is 12 * 3 + 4",
    "When did World War II end?",
    "thanks",
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = RouterConfig::from_env()?;
    let router = QueryRouter::new(&config)?;

    // Arguments form one utterance; with none, run the samples as a conversation
    let args: Vec<String> = std::env::args().skip(1).collect();
    let utterances: Vec<String> = if args.is_empty() {
        SAMPLE_UTTERANCES.iter().map(|s| s.to_string()).collect()
    } else {
        vec![args.join(" ")]
    };

    info!(count = utterances.len(), "Routing utterances");

    let mut session = Session::new();
    for text in utterances {
        session.push(Turn::user(text.clone()));
        let response = router.handle(&text, &session);

        println!("\n> {}", text);
        println!("[{} / {}]", response.source, response.kind);
        println!("{}", response.text);

        session.push(Turn::system(response.text));
    }

    Ok(())
}
