use std::{sync::Arc, time::SystemTime};

use ikebana::*;

// Define regular traits and implementor structs

trait Logger: Send + Sync {
    fn log(&self, content: &str);
}

trait DateLogger: Send + Sync {
    fn log_date(&self);
}

#[derive(Default)]
struct LoggerImpl;

impl Logger for LoggerImpl {
    fn log(&self, content: &str) {
        println!("{}", content);
    }
}

struct DateLoggerImpl {
    logger: Arc<dyn Logger>,
}

impl DateLoggerImpl {
    fn new(logger: Arc<dyn Logger>) -> Self {
        Self { logger }
    }
}

impl DateLogger for DateLoggerImpl {
    fn log_date(&self) {
        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap();
        self.logger.log(&format!("{}s since epoch", now.as_secs()));
    }
}

// Describe the components: provided trait objects and constructors

fn logger() -> ComponentDescriptor {
    ComponentDescriptor::of::<LoggerImpl>()
        .implements::<dyn Logger>(|it| it)
        .constructor(constructor!(LoggerImpl::default))
        .build()
}

fn date_logger() -> ComponentDescriptor {
    ComponentDescriptor::of::<DateLoggerImpl>()
        .stereotype(Stereotype::Service)
        .implements::<dyn DateLogger>(|it| it)
        .constructor(constructor!(DateLoggerImpl::new, dyn Logger))
        .build()
}

// Register them in this module, the registration order does not matter
component!(date_logger, logger);

fn main() -> Result<(), WiringError> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let context = Context::new(module_path!());
    context.init()?;

    let b: Option<Arc<dyn DateLogger>> = context.get("dateLoggerImpl").and_then(Bean::get);
    if let Some(b) = b {
        b.log_date();
    }

    Ok(())
}
