//! Application state and composition.

use std::sync::Arc;

use crate::api::ConnectionManager;
use crate::infrastructure::broadcaster::EventBroadcaster;
use crate::infrastructure::ports::{
    AuthPort, BrokerPort, ClockPort, InterpreterPort, TemplateStorePort,
};
use crate::stores::{PlayerViewStore, WorldStore};
use crate::use_cases::actions::{
    ActionUseCases, CollectItem, DropItem, Examine, GiveItem, Go, InventoryQuery, UpdateLocation,
    UseItem,
};
use crate::use_cases::aoi::BuildAreaOfInterest;
use crate::use_cases::interpret::InterpretCommand;
use crate::use_cases::reset::ResetManager;
use crate::use_cases::CommandRouter;

/// Main application state.
///
/// Holds the stores, the command router, and the ports the API layer
/// talks to. Passed to HTTP/WebSocket handlers via Axum state.
pub struct App {
    pub worlds: Arc<WorldStore>,
    pub players: Arc<PlayerViewStore>,
    pub connections: Arc<ConnectionManager>,
    pub broadcaster: Arc<EventBroadcaster>,
    pub router: Arc<CommandRouter>,
    pub auth: Arc<dyn AuthPort>,
    pub broker: Arc<dyn BrokerPort>,
    pub templates: Arc<dyn TemplateStorePort>,
}

impl App {
    /// Create a new App with all dependencies wired up.
    pub fn new(
        auth: Arc<dyn AuthPort>,
        interpreter: Arc<dyn InterpreterPort>,
        broker: Arc<dyn BrokerPort>,
        templates: Arc<dyn TemplateStorePort>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        let worlds = Arc::new(WorldStore::new());
        let players = Arc::new(PlayerViewStore::new());
        let connections = Arc::new(ConnectionManager::new());
        let broadcaster = Arc::new(EventBroadcaster::new(broker.clone()));

        let actions = ActionUseCases {
            collect: Arc::new(CollectItem::new(worlds.clone(), players.clone())),
            drop: Arc::new(DropItem::new(worlds.clone(), players.clone())),
            give: Arc::new(GiveItem::new(worlds.clone(), players.clone())),
            use_item: Arc::new(UseItem::new(players.clone())),
            examine: Arc::new(Examine::new(worlds.clone(), players.clone())),
            go: Arc::new(Go::new(worlds.clone(), players.clone())),
            update_location: Arc::new(UpdateLocation::new(worlds.clone(), players.clone())),
            inventory: Arc::new(InventoryQuery::new(players.clone())),
        };
        let aoi = Arc::new(BuildAreaOfInterest::new(
            worlds.clone(),
            players.clone(),
            clock.clone(),
        ));
        let interpret = Arc::new(InterpretCommand::new(
            interpreter,
            worlds.clone(),
            players.clone(),
        ));
        let reset = Arc::new(ResetManager::new(
            worlds.clone(),
            players.clone(),
            templates.clone(),
            broadcaster.clone(),
        ));
        let router = Arc::new(CommandRouter::new(
            actions,
            aoi,
            interpret,
            reset,
            broadcaster.clone(),
            clock,
        ));

        Self {
            worlds,
            players,
            connections,
            broadcaster,
            router,
            auth,
            broker,
            templates,
        }
    }
}
