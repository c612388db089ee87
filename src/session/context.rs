//! Per-context state: the store connection, the bulletin snapshot holder,
//! the notifier and the classified view, passed around explicitly.

use std::sync::Arc;

use crate::bulletin::{BulletinHandle, HazardRegion};
use crate::bus::{ChangeEnvelope, EnvelopeReceiver, Notifier, Operation};
use crate::observability::{log_event_with_fields, Event};
use crate::risk::ClassificationResult;
use crate::store::{Point, PointData, PointId, PointStore, StoreResult};

use super::view::{classify_point_data, ClassifiedView};

pub struct CouloirContext {
    store: PointStore,
    bulletin: Arc<BulletinHandle>,
    notifier: Arc<dyn Notifier>,
    view: ClassifiedView,
}

impl CouloirContext {
    /// Builds a context and loads the view from the store.
    pub async fn new(
        store: PointStore,
        bulletin: Arc<BulletinHandle>,
        notifier: Arc<dyn Notifier>,
    ) -> StoreResult<Self> {
        let mut context = Self {
            store,
            bulletin,
            notifier,
            view: ClassifiedView::new(),
        };
        context.reload().await?;
        Ok(context)
    }

    pub fn store(&self) -> &PointStore {
        &self.store
    }

    pub fn bulletin(&self) -> &Arc<BulletinHandle> {
        &self.bulletin
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    pub fn view(&self) -> &ClassifiedView {
        &self.view
    }

    /// Subscribes this context to the other contexts' changes
    pub fn subscribe(&self) -> crate::bus::BusResult<EnvelopeReceiver> {
        self.notifier.subscribe()
    }

    /// Classifies arbitrary point data against the current snapshot.
    pub fn classify(&self, data: &PointData) -> ClassificationResult {
        classify_point_data(data, &self.bulletin.snapshot()).0
    }

    // ==================
    // Mutations: store first, then publish
    // ==================

    pub async fn create(&mut self, data: PointData) -> StoreResult<PointId> {
        let id = self.store.create(data).await?;
        match self.store.read(id).await? {
            Some(point) => {
                self.notifier.send(ChangeEnvelope::add(&point));
                self.upsert(point);
            }
            // Deleted by another context in between.
            None => {
                self.view.remove(id);
            }
        }
        Ok(id)
    }

    pub async fn update(&mut self, point: Point) -> StoreResult<()> {
        self.store.update(point.clone()).await?;
        self.notifier.send(ChangeEnvelope::update(&point));
        self.upsert(point);
        Ok(())
    }

    /// Idempotent delete; only an actual removal is published.
    pub async fn delete(&mut self, id: PointId) -> StoreResult<bool> {
        let existed = self.store.delete(id).await?;
        self.view.remove(id);
        if existed {
            self.notifier.send(ChangeEnvelope::delete(id));
        }
        Ok(existed)
    }

    /// Resets the store, reloads the view and tells every other context to
    /// reload too.
    pub async fn reset(&mut self, reseed: bool) -> StoreResult<usize> {
        let inserted = self.store.reset(reseed).await?;
        self.reload().await?;
        self.notifier.send(ChangeEnvelope::reset());
        Ok(inserted)
    }

    // ==================
    // Reacting to other contexts
    // ==================

    /// Applies a change signal from another context.
    ///
    /// The envelope's payload is never trusted as data: the affected point
    /// is re-read from the store, so repeated or reordered signals converge
    /// on the store's state. `reset`, or a signal naming no point, reloads
    /// everything.
    pub async fn apply(&mut self, envelope: &ChangeEnvelope) -> StoreResult<()> {
        match (envelope.operation, envelope.point_id()) {
            (Operation::Reset, _) | (_, None) => self.reload().await.map(|_| ()),
            (_, Some(id)) => self.refresh(id).await,
        }
    }

    /// Re-reads one point: present means upsert, absent means remove.
    pub async fn refresh(&mut self, id: PointId) -> StoreResult<()> {
        match self.store.read(id).await? {
            Some(point) => self.upsert(point),
            None => {
                self.view.remove(id);
            }
        }
        let id_str = id.to_string();
        log_event_with_fields(Event::ViewPointRefreshed, &[("id", id_str.as_str())]);
        Ok(())
    }

    /// Discards the view and rebuilds it from the store.
    pub async fn reload(&mut self) -> StoreResult<usize> {
        let points = self.store.list().await?;
        let generation = self.bulletin.generation();
        let snapshot = self.bulletin.snapshot();
        self.view.replace_all(points, &snapshot, generation);

        let count = self.view.len().to_string();
        log_event_with_fields(Event::ViewReloaded, &[("points", count.as_str())]);
        Ok(self.view.len())
    }

    // ==================
    // Bulletin
    // ==================

    /// Installs a new region set and reclassifies the view.
    pub fn replace_bulletin(&mut self, regions: Vec<HazardRegion>) -> u64 {
        self.bulletin.replace_regions(regions);
        self.sync_bulletin();
        self.view.generation()
    }

    /// Reclassifies if the shared handle was replaced elsewhere.
    pub fn sync_bulletin(&mut self) -> bool {
        let generation = self.bulletin.generation();
        if generation == self.view.generation() {
            return false;
        }
        let snapshot = self.bulletin.snapshot();
        self.view.reclassify(&snapshot, generation);
        true
    }

    fn upsert(&mut self, point: Point) {
        self.sync_bulletin();
        let snapshot = self.bulletin.snapshot();
        self.view.upsert(point, &snapshot);
    }
}
