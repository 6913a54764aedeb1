#![allow(dead_code)]

use courier::{
    BoxError, Capabilities, HandlerResult, Handler, Message, Notification, OperationContext,
    Outcome, Request, Resource, Subscriber,
};
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

// ============================================================================
// Test Request Types
// ============================================================================

#[derive(Clone, Debug)]
pub struct Echo {
    pub text: String,
}

impl Message for Echo {}
impl Request for Echo {
    type Response = String;
}

#[derive(Clone, Debug)]
pub struct GetPrice {
    pub sku: String,
}

impl Message for GetPrice {}
impl Request for GetPrice {
    type Response = u32;
    const CAPABILITIES: Capabilities = Capabilities::CACHEABLE;

    fn cache_key(&self) -> Option<String> {
        Some(self.sku.clone())
    }
}

#[derive(Clone, Debug)]
pub struct DeleteOrder {
    pub id: u64,
}

impl Message for DeleteOrder {}
impl Request for DeleteOrder {
    type Response = ();
    const CAPABILITIES: Capabilities = Capabilities::AUTHORIZABLE.union(Capabilities::AUDITABLE);

    fn resource(&self) -> Resource {
        Resource::new("Order").with_id(self.id.to_string())
    }
}

// ============================================================================
// Test Notification Types
// ============================================================================

#[derive(Clone, Debug)]
pub struct OrderPlaced {
    pub id: u64,
}

impl Message for OrderPlaced {}
impl Notification for OrderPlaced {}

#[derive(Clone, Debug)]
pub struct Broadcast;

impl Message for Broadcast {}
impl Notification for Broadcast {
    const STRATEGY: Option<courier::FanOut> = Some(courier::FanOut::Parallel);
}

// ============================================================================
// Test Handlers and Subscribers
// ============================================================================

pub struct EchoHandler;

impl Handler<Echo> for EchoHandler {
    async fn handle(&self, request: &Echo, _operation: &OperationContext) -> HandlerResult<String> {
        Ok(Outcome::success(request.text.clone()))
    }
}

/// Counts calls and answers with the sku length.
#[derive(Clone, Default)]
pub struct PriceHandler {
    pub calls: Arc<AtomicUsize>,
}

impl PriceHandler {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Handler<GetPrice> for PriceHandler {
    async fn handle(
        &self,
        request: &GetPrice,
        _operation: &OperationContext,
    ) -> HandlerResult<u32> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Outcome::success(request.sku.len() as u32 * 100))
    }
}

pub struct DeleteOrderHandler;

impl Handler<DeleteOrder> for DeleteOrderHandler {
    async fn handle(
        &self,
        _request: &DeleteOrder,
        _operation: &OperationContext,
    ) -> HandlerResult<()> {
        Ok(Outcome::completed())
    }
}

/// Fails with a cancellation error when the operation is canceled.
pub struct CancelAwareSubscriber;

impl Subscriber<OrderPlaced> for CancelAwareSubscriber {
    async fn handle(
        &self,
        _notification: &OrderPlaced,
        operation: &OperationContext,
    ) -> Result<(), BoxError> {
        operation.cancellation().check()?;
        Ok(())
    }
}
