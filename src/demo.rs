// Demo mode: send realistic sample traffic to our own listener
//
// Plays the part of a web application instrumented with the connector: one
// "request" writes user messages, a warning, request parameters and session
// data to their channels, then goes quiet for longer than the idle timeout
// so the next request starts on clean channels.
//
// Run with: MAURINA_DEMO=1 cargo run --release

use crate::connector::Connector;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::sleep;

/// Captions the demo producer announces, with `&` mnemonic markers
pub const DEMO_CAPTIONS: [&str; 5] = ["&User", "&Errors", "&Request", "&Session", "&Cookies"];

const USER: usize = 0;
const ERRORS: usize = 1;
const REQUEST: usize = 2;
const SESSION: usize = 3;
const COOKIES: usize = 4;

/// Quiet period between simulated requests
const REQUEST_GAP: Duration = Duration::from_secs(4);

/// One thing the simulated application does
#[derive(Debug, Clone)]
enum DemoStep {
    /// Plain text through `Connector::log`
    Log(usize, String),
    /// Markup sent verbatim
    Markup(usize, String),
    /// Key/value table through `Connector::dump`
    Dump(usize, Vec<(String, String)>),
    Pause(u64),
}

/// Drive the demo until shutdown
pub async fn run_demo(target: SocketAddr, mut shutdown_rx: oneshot::Receiver<()>) {
    // Initial delay to let TUI render
    sleep(Duration::from_millis(1500)).await;

    let captions = DEMO_CAPTIONS.iter().map(|c| c.to_string()).collect();
    let address = target.ip().to_string();
    let mut connector = match Connector::new(&address, target.port(), captions).await {
        Ok(connector) => connector.with_time(true),
        Err(e) => {
            tracing::error!("Demo producer could not start: {}", e);
            return;
        }
    };

    for request in 1u64.. {
        for step in generate_request(request) {
            if shutdown_rx.try_recv().is_ok() {
                return;
            }
            if let Err(e) = play(&mut connector, step).await {
                tracing::warn!("Demo send failed: {}", e);
            }
        }

        tokio::select! {
            _ = &mut shutdown_rx => return,
            _ = sleep(REQUEST_GAP) => {}
        }
    }
}

async fn play(
    connector: &mut Connector,
    step: DemoStep,
) -> Result<(), crate::connector::ConnectorError> {
    match step {
        DemoStep::Log(channel, message) => {
            connector.log(channel, &message).await?;
        }
        DemoStep::Markup(channel, markup) => {
            connector.send(channel, &markup).await?;
        }
        DemoStep::Dump(channel, pairs) => {
            connector.dump(channel, &pairs).await?;
        }
        DemoStep::Pause(ms) => sleep(Duration::from_millis(ms)).await,
    }
    Ok(())
}

/// Steps for one simulated request
fn generate_request(request: u64) -> Vec<DemoStep> {
    let user = ["ana", "bob", "carmen", "dmitri"][(request % 4) as usize];
    let path = ["/cart", "/checkout", "/profile", "/search?q=rust"][(request % 4) as usize];

    let pairs = |items: &[(&str, &str)]| -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    };

    let mut steps = vec![
        DemoStep::Markup(USER, format!("<h1>Request #{} {}</h1>", request, path)),
        DemoStep::Dump(
            REQUEST,
            pairs(&[("method", "GET"), ("path", path), ("user", user)]),
        ),
        DemoStep::Pause(300),
        DemoStep::Log(USER, format!("Loading profile for {}", user)),
        DemoStep::Markup(
            USER,
            format!(
                "Query took <var>{} ms</var>",
                12 + (request * 7) % 40
            ),
        ),
        DemoStep::Pause(400),
        DemoStep::Dump(
            SESSION,
            pairs(&[("id", "9f2c61"), ("user", user), ("cart_items", "3")]),
        ),
        DemoStep::Dump(COOKIES, pairs(&[("theme", "dark"), ("lang", "es")])),
        DemoStep::Pause(300),
        DemoStep::Markup(
            USER,
            "<h3>Template</h3><pre>{% for item in cart %}\n  {{ item.name }}\n{% endfor %}</pre>"
                .to_string(),
        ),
    ];

    if request % 2 == 0 {
        steps.push(DemoStep::Markup(
            ERRORS,
            format!(
                "<span style='color:#ff9e9e'>[E_WARNING] Line {} in cart.php</span><br />\
                 <em>Undefined index: coupon</em>",
                40 + request % 10
            ),
        ));
    }

    steps.push(DemoStep::Log(USER, "Done <200 OK>".to_string()));
    steps
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_steps_target_existing_channels() {
        for request in 1..=4 {
            for step in generate_request(request) {
                let channel = match step {
                    DemoStep::Log(c, _) | DemoStep::Markup(c, _) | DemoStep::Dump(c, _) => c,
                    DemoStep::Pause(_) => continue,
                };
                assert!(channel < DEMO_CAPTIONS.len());
            }
        }
    }

    #[test]
    fn test_errors_only_on_even_requests() {
        let has_error = |request| {
            generate_request(request)
                .iter()
                .any(|s| matches!(s, DemoStep::Markup(ERRORS, _)))
        };
        assert!(!has_error(1));
        assert!(has_error(2));
    }
}
