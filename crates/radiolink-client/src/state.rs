use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use radiolink_proto::{Channel, Config, DeviceMetadata, ModuleConfig, MyNodeInfo, NodeInfo};

/// Point-in-time copy of everything learned about the attached radio.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    /// Id sent with the configuration request.
    pub config_id: u32,
    /// Set once the radio acknowledged the end of its configuration stream.
    pub complete: bool,
    pub node_info: Option<MyNodeInfo>,
    pub device_metadata: Option<DeviceMetadata>,
    pub nodes: Vec<NodeInfo>,
    pub channels: Vec<Channel>,
    pub configs: Vec<Config>,
    pub modules: Vec<ModuleConfig>,
}

/// Session state shared between the decode thread and callers.
///
/// The decode thread is the only writer. Every reader gets an owned copy
/// taken under the read lock, never a reference into the live collections.
/// `complete` goes from false to true at most once; collections only grow.
#[derive(Debug, Default)]
pub struct SessionState {
    inner: RwLock<SessionSnapshot>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_config_id(&self, id: u32) {
        self.write().config_id = id;
    }

    /// Mark the configuration stream complete.
    ///
    /// Returns `true` only for the call that performed the transition.
    pub fn mark_complete(&self) -> bool {
        let mut data = self.write();
        if data.complete {
            return false;
        }
        data.complete = true;
        true
    }

    pub fn set_node_info(&self, info: MyNodeInfo) {
        self.write().node_info = Some(info);
    }

    pub fn set_device_metadata(&self, metadata: DeviceMetadata) {
        self.write().device_metadata = Some(metadata);
    }

    pub fn append_node(&self, node: NodeInfo) {
        self.write().nodes.push(node);
    }

    pub fn append_channel(&self, channel: Channel) {
        self.write().channels.push(channel);
    }

    pub fn append_config(&self, config: Config) {
        self.write().configs.push(config);
    }

    pub fn append_module(&self, module: ModuleConfig) {
        self.write().modules.push(module);
    }

    pub fn is_complete(&self) -> bool {
        self.read().complete
    }

    pub fn config_id(&self) -> u32 {
        self.read().config_id
    }

    pub fn node_info(&self) -> Option<MyNodeInfo> {
        self.read().node_info.clone()
    }

    pub fn device_metadata(&self) -> Option<DeviceMetadata> {
        self.read().device_metadata.clone()
    }

    pub fn nodes(&self) -> Vec<NodeInfo> {
        self.read().nodes.clone()
    }

    pub fn channels(&self) -> Vec<Channel> {
        self.read().channels.clone()
    }

    pub fn configs(&self) -> Vec<Config> {
        self.read().configs.clone()
    }

    pub fn modules(&self) -> Vec<ModuleConfig> {
        self.read().modules.clone()
    }

    /// Copy every field under a single read lock.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.read().clone()
    }

    // Writers only assign or push whole values, so a poisoned lock never
    // guards a torn value.
    fn read(&self) -> RwLockReadGuard<'_, SessionSnapshot> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionSnapshot> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
