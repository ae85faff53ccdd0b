//! Action Dispatcher
//!
//! Maps decided actions to executors. Direct actions are plain functions over
//! the payload. The general query path crosses into the async orchestrator on
//! a runtime that lives exactly as long as one call.

use crate::dialog::{
    ACTION_GENERAL_QUERY, ACTION_GOODBYE, ACTION_GREET, ACTION_HELP, ACTION_STOCK_QUOTE,
    ACTION_THANKS,
};
use crate::error::RouterError;
use crate::extractor::{ENTITY_TICKER, INTENT_STOCK_PRICE};
use crate::models::{kind, DecisionMode, DialogDecision, Payload, Response};
use crate::orchestrator::QueryOrchestrator;
use crate::Result;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

pub const SOURCE_DISPATCHER: &str = "dispatcher";
pub const SOURCE_DIALOG: &str = "dialog";

/// Shown to users for any internal failure. The real error only goes to the logs.
pub const SAFE_ERROR_MESSAGE: &str =
    "Sorry, something went wrong while handling your request. Please try again.";

const RUNTIME_SHUTDOWN_GRACE: Duration = Duration::from_millis(100);

pub type ActionExecutor = fn(&Payload) -> Result<Response>;

pub struct ActionDispatcher {
    executors: HashMap<&'static str, ActionExecutor>,
    orchestrator: Arc<QueryOrchestrator>,
}

impl ActionDispatcher {
    pub fn new(orchestrator: Arc<QueryOrchestrator>) -> Self {
        Self {
            executors: default_executors(),
            orchestrator,
        }
    }

    pub fn actions(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.executors.keys().copied().collect();
        names.push(ACTION_GENERAL_QUERY);
        names.sort_unstable();
        names
    }

    /// Never panics, never returns an error: faults become an `error` response
    pub fn execute(&self, decision: &DialogDecision) -> Response {
        debug!(
            mode = %decision.mode,
            action = decision.action_name.as_deref().unwrap_or("-"),
            "Executing decision"
        );

        match decision.mode {
            DecisionMode::Clarify => clarify(&decision.payload),
            DecisionMode::Escalate => self.general_query(decision.query()),
            DecisionMode::DirectAction => {
                let Some(action) = decision.action_name.as_deref() else {
                    return internal_error(&RouterError::DispatchError(
                        "direct action without an action name".to_string(),
                    ));
                };

                if action == ACTION_GENERAL_QUERY {
                    return self.general_query(decision.query());
                }

                match self.executors.get(action) {
                    Some(executor) => {
                        executor(&decision.payload).unwrap_or_else(|e| internal_error(&e))
                    }
                    None => internal_error(&RouterError::UnknownAction(action.to_string())),
                }
            }
        }
    }

    fn general_query(&self, query: &str) -> Response {
        if query.trim().is_empty() {
            debug!("Empty query, fallback chain only");
        }

        self.run_scoped(query)
            .unwrap_or_else(|e| internal_error(&e))
    }

    /// Runs the query on its own runtime. A thread that already carries a
    /// runtime context cannot host another one, so the runtime moves to a
    /// scoped helper thread in that case.
    fn run_scoped(&self, query: &str) -> Result<Response> {
        if tokio::runtime::Handle::try_current().is_err() {
            return self.run_on_fresh_runtime(query);
        }

        std::thread::scope(|scope| {
            scope
                .spawn(|| self.run_on_fresh_runtime(query))
                .join()
                .unwrap_or_else(|_| {
                    Err(RouterError::DispatchError("query thread panicked".to_string()))
                })
        })
    }

    /// Build a runtime, run the query as a joined task, tear the runtime down.
    fn run_on_fresh_runtime(&self, query: &str) -> Result<Response> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| RouterError::RuntimeError(format!("failed to build request runtime: {}", e)))?;

        let orchestrator = Arc::clone(&self.orchestrator);
        let query = query.to_string();

        let joined = runtime.block_on(async move {
            tokio::spawn(async move { orchestrator.answer(&query).await }).await
        });

        runtime.shutdown_timeout(RUNTIME_SHUTDOWN_GRACE);

        joined.map_err(|e| {
            if e.is_panic() {
                RouterError::DispatchError("query task panicked".to_string())
            } else {
                RouterError::DispatchError("query task was cancelled".to_string())
            }
        })
    }
}

fn default_executors() -> HashMap<&'static str, ActionExecutor> {
    let mut executors: HashMap<&'static str, ActionExecutor> = HashMap::new();
    executors.insert(ACTION_GREET, greet);
    executors.insert(ACTION_GOODBYE, goodbye);
    executors.insert(ACTION_THANKS, thanks);
    executors.insert(ACTION_HELP, help);
    executors.insert(ACTION_STOCK_QUOTE, stock_quote);
    executors
}

fn internal_error(err: &RouterError) -> Response {
    error!(error = %err, "Dispatch fault");
    Response::new(SAFE_ERROR_MESSAGE, SOURCE_DISPATCHER, kind::ERROR)
}

fn clarify(payload: &Payload) -> Response {
    let text = match payload.get("intent").map(String::as_str) {
        Some(INTENT_STOCK_PRICE) => {
            "Which stock do you mean? Try a ticker like AAPL or a cash-tag like $TSLA."
        }
        _ => "I'm not sure I understood. Could you rephrase that?",
    };
    Response::new(text, SOURCE_DIALOG, kind::CLARIFY)
}

//
// ================= Direct Actions =================
//

fn greet(_payload: &Payload) -> Result<Response> {
    Ok(Response::new(
        "Hello! Ask me about stock quotes, crypto outlooks, security architecture, \
         protocol migrations, pricing, or a quick calculation.",
        ACTION_GREET,
        "greet",
    ))
}

fn goodbye(_payload: &Payload) -> Result<Response> {
    Ok(Response::new("Goodbye! Come back any time.", ACTION_GOODBYE, "goodbye"))
}

fn thanks(_payload: &Payload) -> Result<Response> {
    Ok(Response::new("You're welcome!", ACTION_THANKS, "thanks"))
}

fn help(_payload: &Payload) -> Result<Response> {
    Ok(Response::new(
        "I can:\n\
         - quote a stock (\"AAPL price\", \"$tsla quote\")\n\
         - sketch a crypto outlook (\"what will XRP be worth in 10 years\")\n\
         - give security architecture and protocol migration guidance\n\
         - project pricing and revenue\n\
         - do quick arithmetic (\"how much is 12 * 3\")\n\
         - answer general questions from reference knowledge and web search",
        ACTION_HELP,
        "help",
    ))
}

/// Quote lookup is delegated to the market data service; this only acknowledges it
fn stock_quote(payload: &Payload) -> Result<Response> {
    let ticker = payload
        .get(ENTITY_TICKER)
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| RouterError::InvalidPayload {
            action: ACTION_STOCK_QUOTE.to_string(),
            reason: "missing ticker".to_string(),
        })?;

    Ok(Response::new(
        format!("Fetching the latest quote for {} from the market data service.", ticker),
        ACTION_STOCK_QUOTE,
        "stock_quote",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback::{knowledge, FallbackChain, DEFAULT_MESSAGE};
    use crate::responders::default_handler_table;
    use std::thread;

    fn dispatcher() -> ActionDispatcher {
        let orchestrator =
            QueryOrchestrator::new(default_handler_table(), FallbackChain::without_search());
        ActionDispatcher::new(Arc::new(orchestrator))
    }

    fn decision(mode: DecisionMode, action: Option<&str>, pairs: &[(&str, &str)]) -> DialogDecision {
        DialogDecision {
            mode,
            action_name: action.map(str::to_string),
            payload: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn test_unknown_action_is_safe_error() {
        let response = dispatcher().execute(&decision(
            DecisionMode::DirectAction,
            Some("action_launch_rockets"),
            &[],
        ));

        assert_eq!(response.kind, kind::ERROR);
        assert_eq!(response.text, SAFE_ERROR_MESSAGE);
        assert!(!response.text.contains("launch_rockets"));
    }

    #[test]
    fn test_direct_actions() {
        let dispatcher = dispatcher();

        let response = dispatcher.execute(&decision(DecisionMode::DirectAction, Some(ACTION_GREET), &[]));
        assert_eq!(response.kind, "greet");
        assert_eq!(response.source, ACTION_GREET);

        let response = dispatcher.execute(&decision(
            DecisionMode::DirectAction,
            Some(ACTION_STOCK_QUOTE),
            &[("ticker", "AAPL")],
        ));
        assert_eq!(response.kind, "stock_quote");
        assert!(response.text.contains("AAPL"));
    }

    #[test]
    fn test_executor_failure_is_safe_error() {
        let response = dispatcher().execute(&decision(
            DecisionMode::DirectAction,
            Some(ACTION_STOCK_QUOTE),
            &[],
        ));
        assert_eq!(response.kind, kind::ERROR);
        assert!(!response.text.contains("ticker"));
    }

    #[test]
    fn test_missing_action_name_is_safe_error() {
        let response = dispatcher().execute(&decision(DecisionMode::DirectAction, None, &[]));
        assert_eq!(response.kind, kind::ERROR);
    }

    #[test]
    fn test_escalation_paths() {
        let dispatcher = dispatcher();

        let response = dispatcher.execute(&decision(
            DecisionMode::Escalate,
            Some(ACTION_GENERAL_QUERY),
            &[("query", "When did World War II end?")],
        ));
        assert_eq!(response.text, knowledge::WORLD_WAR_II_END);

        let response = dispatcher.execute(&decision(
            DecisionMode::Escalate,
            Some(ACTION_GENERAL_QUERY),
            &[("query", "")],
        ));
        assert_eq!(response.kind, kind::DEFAULT);
        assert_eq!(response.text, DEFAULT_MESSAGE);

        let response = dispatcher.execute(&decision(
            DecisionMode::DirectAction,
            Some(ACTION_GENERAL_QUERY),
            &[("query", "how much will XRP be worth in 10 years")],
        ));
        assert_eq!(response.source, "crypto_forecast");
    }

    #[test]
    fn test_clarify() {
        let response = dispatcher().execute(&decision(
            DecisionMode::Clarify,
            None,
            &[("intent", INTENT_STOCK_PRICE)],
        ));
        assert_eq!(response.kind, kind::CLARIFY);
        assert!(response.text.contains("Which stock"));
    }

    #[test]
    fn test_concurrent_calls_use_independent_runtimes() {
        let dispatcher = Arc::new(dispatcher());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let dispatcher = Arc::clone(&dispatcher);
                thread::spawn(move || {
                    let query = format!("how much is {} + {}", i, i);
                    let response = dispatcher.execute(&decision(
                        DecisionMode::Escalate,
                        Some(ACTION_GENERAL_QUERY),
                        &[("query", query.as_str())],
                    ));
                    (i, response)
                })
            })
            .collect();

        for handle in handles {
            let (i, response) = handle.join().unwrap();
            assert_eq!(response.source, "arithmetic");
            assert!(response.text.ends_with(&format!("= {}", i * 2)));
        }
    }

    #[tokio::test]
    async fn test_execute_from_inside_a_runtime() {
        let response = dispatcher().execute(&decision(
            DecisionMode::Escalate,
            Some(ACTION_GENERAL_QUERY),
            &[("query", "When did World War II end?")],
        ));
        assert_eq!(response.text, knowledge::WORLD_WAR_II_END);
    }

    #[tokio::test]
    async fn test_execute_on_blocking_pool() {
        let dispatcher = Arc::new(dispatcher());
        let response = tokio::task::spawn_blocking(move || {
            dispatcher.execute(&decision(
                DecisionMode::Escalate,
                Some(ACTION_GENERAL_QUERY),
                &[("query", "how much is 6 * 7")],
            ))
        })
        .await
        .unwrap();
        assert_eq!(response.source, "arithmetic");
    }

    #[test]
    fn test_actions_listing() {
        let actions = dispatcher().actions();
        assert!(actions.contains(&ACTION_GENERAL_QUERY));
        assert!(actions.contains(&ACTION_HELP));
        assert_eq!(actions.len(), 6);
    }
}
