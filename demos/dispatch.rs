//! Notification dispatch - chain-of-responsibility over a constrained
//! collection.
//!
//! This example demonstrates:
//! - Registering a contract and the handler types that satisfy it
//! - Building a constrained, priority-ordered collection
//! - Dispatching by walking handlers in priority order
//!
//! Run with: `cargo run --example dispatch`

use std::sync::Arc;

use handler_collection::{contract, handler_type, Handler, HandlerCollection, Prioritized};

/// What the dispatcher actually asks of a handler.
trait Channel {
    fn supports(&self, target: &str) -> bool;
    fn deliver(&self, target: &str, message: &str);
}

/// SMS delivery - specific, so it claims a high priority.
struct Sms;

impl Channel for Sms {
    fn supports(&self, target: &str) -> bool {
        target.starts_with('+')
    }

    fn deliver(&self, target: &str, message: &str) {
        println!("sms to {target}: {message}");
    }
}

impl Handler for Sms {
    fn as_prioritized(&self) -> Option<&dyn Prioritized> {
        Some(self)
    }
}

impl Prioritized for Sms {
    fn priority(&self) -> i32 {
        10
    }
}

/// Email delivery - no declared priority, sorts at 0.
struct Email;

impl Channel for Email {
    fn supports(&self, target: &str) -> bool {
        target.contains('@')
    }

    fn deliver(&self, target: &str, message: &str) {
        println!("email to {target}: {message}");
    }
}

impl Handler for Email {}

/// Catch-all that logs anything, tried last.
struct AuditLog;

impl Channel for AuditLog {
    fn supports(&self, _target: &str) -> bool {
        true
    }

    fn deliver(&self, target: &str, message: &str) {
        println!("audit log for {target}: {message}");
    }
}

impl Handler for AuditLog {
    fn as_prioritized(&self) -> Option<&dyn Prioritized> {
        Some(self)
    }
}

impl Prioritized for AuditLog {
    fn priority(&self) -> i32 {
        -10
    }
}

/// Bridge from the stored trait object to the dispatch interface.
fn as_channel(handler: &dyn Handler) -> Option<&dyn Channel> {
    if let Some(sms) = handler.downcast_ref::<Sms>() {
        return Some(sms);
    }
    if let Some(email) = handler.downcast_ref::<Email>() {
        return Some(email);
    }
    if let Some(audit) = handler.downcast_ref::<AuditLog>() {
        return Some(audit);
    }
    None
}

contract!("Channel", |h| as_channel(h).is_some());
handler_type!("Sms", Sms, contracts: ["Channel"]);
handler_type!("Email", Email, contracts: ["Channel"]);
handler_type!("AuditLog", AuditLog, contracts: ["Channel"]);

fn dispatch(channels: &HandlerCollection, target: &str, message: &str) {
    // First supporting handler in priority order wins.
    let handler = channels.find(|h| as_channel(h).is_some_and(|c| c.supports(target)));
    match handler {
        Some(handler) => as_channel(handler.as_ref())
            .expect("constrained collection holds only channels")
            .deliver(target, message),
        None => println!("no channel for {target}"),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let initial: Vec<Arc<dyn Handler>> = vec![Arc::new(AuditLog), Arc::new(Email), Arc::new(Sms)];
    let channels = HandlerCollection::new(initial, Some("Channel"))?;

    // Phone numbers hit SMS before the audit log despite insertion order.
    dispatch(&channels, "+15550100", "builds are green");
    dispatch(&channels, "oncall@example.com", "builds are green");
    dispatch(&channels, "pager-7", "builds are green");

    Ok(())
}
