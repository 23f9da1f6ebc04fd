use httption::{Action, ActionOption, Config, LoggingTransport, Method, ReqwestTransport, StatusHandler};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();

    let url = std::env::args().nth(1).unwrap_or_else(|| "http://localhost:4488/api/proxy".to_string());
    let config = Config::load_from_str(include_str!("./config.toml")).unwrap();

    let transport = LoggingTransport::new(ReqwestTransport::new(config.transport.clone()).unwrap());
    let mut action = Action::new("ProxyCheck", transport, Method::GET, url);

    let result = action
        .execute([
            ActionOption::with_retry(Some(config.retry.max_retry), None, Some(config.retry.retry_delay())),
            ActionOption::with_status_code_handler(204, StatusHandler::reject()),
        ])
        .await;

    if let Err(e) = result {
        println!("Action failed: {}", e);
        return;
    }

    let mut outputs = serde_json::Value::Null;
    action.decode_result(&mut outputs).unwrap();
    println!("Outputs: {:#?}", outputs);
}
