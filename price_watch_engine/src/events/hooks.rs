use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{AnomalyDetectedEvent, EventHandler, EventProducer, Handler, WatchExecutedEvent, WatchExpiredEvent};

type HookFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

#[derive(Default, Clone)]
pub struct EventProducers {
    pub watch_executed_producer: Vec<EventProducer<WatchExecutedEvent>>,
    pub watch_expired_producer: Vec<EventProducer<WatchExpiredEvent>>,
    pub anomaly_producer: Vec<EventProducer<AnomalyDetectedEvent>>,
}

impl EventProducers {
    pub async fn publish_executed(&self, event: WatchExecutedEvent) {
        for producer in &self.watch_executed_producer {
            producer.publish_event(event.clone()).await;
        }
    }

    pub async fn publish_expired(&self, event: WatchExpiredEvent) {
        for producer in &self.watch_expired_producer {
            producer.publish_event(event.clone()).await;
        }
    }

    pub async fn publish_anomaly(&self, event: AnomalyDetectedEvent) {
        for producer in &self.anomaly_producer {
            producer.publish_event(event.clone()).await;
        }
    }
}

pub struct EventHandlers {
    pub on_watch_executed: Option<EventHandler<WatchExecutedEvent>>,
    pub on_watch_expired: Option<EventHandler<WatchExpiredEvent>>,
    pub on_anomaly: Option<EventHandler<AnomalyDetectedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_watch_executed = hooks.on_watch_executed.map(|f| EventHandler::new(buffer_size, f));
        let on_watch_expired = hooks.on_watch_expired.map(|f| EventHandler::new(buffer_size, f));
        let on_anomaly = hooks.on_anomaly.map(|f| EventHandler::new(buffer_size, f));
        Self { on_watch_executed, on_watch_expired, on_anomaly }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_watch_executed {
            result.watch_executed_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_watch_expired {
            result.watch_expired_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_anomaly {
            result.anomaly_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_watch_executed {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_watch_expired {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_anomaly {
            tokio::spawn(handler.start_handler());
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_watch_executed: Option<Handler<WatchExecutedEvent>>,
    pub on_watch_expired: Option<Handler<WatchExpiredEvent>>,
    pub on_anomaly: Option<Handler<AnomalyDetectedEvent>>,
}

impl EventHooks {
    pub fn on_watch_executed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(WatchExecutedEvent) -> HookFuture) + Send + Sync + 'static {
        self.on_watch_executed = Some(Arc::new(f));
        self
    }

    pub fn on_watch_expired<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(WatchExpiredEvent) -> HookFuture) + Send + Sync + 'static {
        self.on_watch_expired = Some(Arc::new(f));
        self
    }

    pub fn on_anomaly<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(AnomalyDetectedEvent) -> HookFuture) + Send + Sync + 'static {
        self.on_anomaly = Some(Arc::new(f));
        self
    }
}
