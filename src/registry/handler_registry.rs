//! # Handler Registry
//!
//! Explicit, ordered registration of handler plugins for one actor pool.
//! The registry is moved into a router builder and frozen there; nothing can
//! be registered once a router exists.
//!
//! ## Rules
//!
//! - Commands are keyed by exact name; re-registering a name replaces the
//!   earlier handler with a warning
//! - Callback prefixes keep registration order and must be mutually
//!   exclusive: no prefix may be a prefix of another
//! - One message handler per pool; the last registration wins with a warning

use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::traits::{CallbackHandler, CommandHandler, MessageHandler};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("Command name cannot be empty")]
    EmptyCommand,

    #[error("Callback prefix cannot be empty")]
    EmptyPrefix,

    #[error("Callback prefix '{new}' overlaps registered prefix '{existing}'")]
    OverlappingPrefix { existing: String, new: String },
}

#[derive(Default)]
pub struct HandlerRegistry {
    commands: Vec<Arc<dyn CommandHandler>>,
    callbacks: Vec<Arc<dyn CallbackHandler>>,
    message: Option<Arc<dyn MessageHandler>>,
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field(
                "commands",
                &self.commands.iter().map(|h| h.command()).collect::<Vec<_>>(),
            )
            .field(
                "callbacks",
                &self.callbacks.iter().map(|h| h.prefix()).collect::<Vec<_>>(),
            )
            .field("message", &self.message.as_ref().map(|h| h.name()))
            .finish()
    }
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_command(
        &mut self,
        handler: Arc<dyn CommandHandler>,
    ) -> Result<&mut Self, RegistryError> {
        let command = handler.command().to_string();
        if command.trim().is_empty() {
            return Err(RegistryError::EmptyCommand);
        }

        if let Some(position) = self.commands.iter().position(|h| h.command() == command) {
            warn!(
                command = %command,
                previous = self.commands[position].name(),
                "Replacing existing command handler"
            );
            self.commands.remove(position);
        }

        info!(command = %command, handler = handler.name(), "Registered command handler");
        self.commands.push(handler);
        Ok(self)
    }

    pub fn register_callback(
        &mut self,
        handler: Arc<dyn CallbackHandler>,
    ) -> Result<&mut Self, RegistryError> {
        let prefix = handler.prefix().to_string();
        if prefix.is_empty() {
            return Err(RegistryError::EmptyPrefix);
        }

        if let Some(existing) = self
            .callbacks
            .iter()
            .map(|h| h.prefix())
            .find(|existing| existing.starts_with(prefix.as_str()) || prefix.starts_with(existing))
        {
            return Err(RegistryError::OverlappingPrefix {
                existing: existing.to_string(),
                new: prefix,
            });
        }

        info!(prefix = %prefix, handler = handler.name(), "Registered callback handler");
        self.callbacks.push(handler);
        Ok(self)
    }

    pub fn register_message(&mut self, handler: Arc<dyn MessageHandler>) -> &mut Self {
        if let Some(previous) = &self.message {
            warn!(
                previous = previous.name(),
                replacement = handler.name(),
                "Replacing message handler; only one is supported per pool"
            );
        }
        info!(handler = handler.name(), "Registered message handler");
        self.message = Some(handler);
        self
    }

    pub fn command_count(&self) -> usize {
        self.commands.len()
    }

    pub fn callback_count(&self) -> usize {
        self.callbacks.len()
    }

    pub fn has_message_handler(&self) -> bool {
        self.message.is_some()
    }

    /// Consume the registry into the immutable lookup tables a router uses
    pub fn freeze(self) -> RouteTable {
        let commands: HashMap<String, Arc<dyn CommandHandler>> = self
            .commands
            .into_iter()
            .map(|handler| (handler.command().to_string(), handler))
            .collect();

        let callbacks: Vec<(String, Arc<dyn CallbackHandler>)> = self
            .callbacks
            .into_iter()
            .map(|handler| (handler.prefix().to_string(), handler))
            .collect();

        debug!(
            commands = commands.len(),
            callbacks = callbacks.len(),
            has_message_handler = self.message.is_some(),
            "Handler registry frozen"
        );

        RouteTable {
            commands,
            callbacks,
            message: self.message,
        }
    }
}

/// Frozen handler lookup tables
pub struct RouteTable {
    commands: HashMap<String, Arc<dyn CommandHandler>>,
    callbacks: Vec<(String, Arc<dyn CallbackHandler>)>,
    message: Option<Arc<dyn MessageHandler>>,
}

impl std::fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteTable")
            .field("commands", &self.commands.keys().collect::<Vec<_>>())
            .field(
                "callbacks",
                &self.callbacks.iter().map(|(p, _)| p).collect::<Vec<_>>(),
            )
            .field("has_message_handler", &self.message.is_some())
            .finish()
    }
}

impl RouteTable {
    pub fn command(&self, name: &str) -> Option<&Arc<dyn CommandHandler>> {
        self.commands.get(name)
    }

    /// First registered prefix the payload starts with
    pub fn callback(&self, data: &str) -> Option<&Arc<dyn CallbackHandler>> {
        self.callbacks
            .iter()
            .find(|(prefix, _)| data.starts_with(prefix.as_str()))
            .map(|(_, handler)| handler)
    }

    pub fn message(&self) -> Option<&Arc<dyn MessageHandler>> {
        self.message.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::HandlerResult;
    use crate::models::{Actor, CanonicalEvent};
    use async_trait::async_trait;

    struct Prefix(&'static str);

    #[async_trait]
    impl CallbackHandler for Prefix {
        fn prefix(&self) -> &str {
            self.0
        }

        async fn handle(&self, _event: &CanonicalEvent, _actor: Actor) -> HandlerResult {
            Ok(())
        }
    }

    struct Command(&'static str);

    #[async_trait]
    impl CommandHandler for Command {
        fn command(&self) -> &str {
            self.0
        }

        async fn handle(&self, _event: &CanonicalEvent) -> HandlerResult {
            Ok(())
        }
    }

    #[test]
    fn test_overlapping_prefixes_rejected() {
        let mut registry = HandlerRegistry::new();
        registry.register_callback(Arc::new(Prefix("policy_"))).unwrap();
        registry.register_callback(Arc::new(Prefix("approval_"))).unwrap();

        assert_eq!(
            registry
                .register_callback(Arc::new(Prefix("policy_accept")))
                .unwrap_err(),
            RegistryError::OverlappingPrefix {
                existing: "policy_".to_string(),
                new: "policy_accept".to_string(),
            }
        );
        assert!(registry.register_callback(Arc::new(Prefix("pol"))).is_err());
        assert!(registry.register_callback(Arc::new(Prefix(""))).is_err());
        assert_eq!(registry.callback_count(), 2);
    }

    #[test]
    fn test_command_reregistration_replaces() {
        let mut registry = HandlerRegistry::new();
        registry.register_command(Arc::new(Command("start"))).unwrap();
        registry.register_command(Arc::new(Command("start"))).unwrap();
        registry.register_command(Arc::new(Command("help"))).unwrap();
        assert_eq!(registry.command_count(), 2);
        assert_eq!(
            registry.register_command(Arc::new(Command(" "))).unwrap_err(),
            RegistryError::EmptyCommand
        );
    }

    #[test]
    fn test_frozen_table_lookup() {
        let mut registry = HandlerRegistry::new();
        registry.register_command(Arc::new(Command("start"))).unwrap();
        registry.register_callback(Arc::new(Prefix("policy_"))).unwrap();
        let table = registry.freeze();

        assert!(table.command("start").is_some());
        assert!(table.command("star").is_none());
        assert_eq!(table.callback("policy_accept").map(|h| h.prefix()), Some("policy_"));
        assert!(table.callback("approval_accept_x").is_none());
        assert!(table.message().is_none());
    }
}
