use std::collections::{BTreeMap, HashSet};
use std::rc::Rc;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::auth::Session;
use crate::storage::{CARGO_LIST_KEY, HISTORY_KEY, KvOp, KvStore, PHOTOS_KEY, StorageError};

use super::CargoError;
use super::aggregate::{GroupSummary, Totals, aggregate, group_by_key};
use super::shipment::ShipmentSnapshot;
use super::types::{CargoInput, CargoRecord, Limits, Photo, group_key};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Empty,
    Populated,
}

/// The live cargo list of the signed-in employee plus the shipment history.
///
/// The in-memory list is authoritative. Every mutation is followed by a
/// write of the whole list; when that write fails the change is kept and
/// `flush` can retry it. Photo bytes live apart from the records, once per
/// batch, and are rewritten only when a batch gains or loses them.
pub(crate) struct CargoStore {
    kv: Rc<dyn KvStore>,
    limits: Limits,
    records: Vec<CargoRecord>,
    photos: BTreeMap<u64, Vec<Photo>>,
    photos_dirty: bool,
    history: Vec<ShipmentSnapshot>,
    last_id: u64,
    warning: Option<String>,
}

impl CargoStore {
    /// Load the persisted list and history. Unreadable values start empty.
    pub(crate) fn open(kv: Rc<dyn KvStore>, limits: Limits) -> Result<Self, StorageError> {
        let mut warnings = Vec::new();
        let records: Vec<CargoRecord> = load_or_default(kv.as_ref(), CARGO_LIST_KEY, &mut warnings)?;
        let photos: BTreeMap<u64, Vec<Photo>> =
            load_or_default(kv.as_ref(), PHOTOS_KEY, &mut warnings)?;
        let history: Vec<ShipmentSnapshot> = load_or_default(kv.as_ref(), HISTORY_KEY, &mut warnings)?;
        let last_id = records.iter().map(|r| r.id).max().unwrap_or(0);
        debug!(records = records.len(), shipments = history.len(), "cargo store opened");

        Ok(Self {
            kv,
            limits,
            records,
            photos,
            photos_dirty: false,
            history,
            last_id,
            warning: (!warnings.is_empty()).then(|| warnings.join("; ")),
        })
    }

    pub(crate) fn records(&self) -> &[CargoRecord] {
        &self.records
    }

    pub(crate) fn history(&self) -> &[ShipmentSnapshot] {
        &self.history
    }

    pub(crate) fn phase(&self) -> Phase {
        if self.records.is_empty() {
            Phase::Empty
        } else {
            Phase::Populated
        }
    }

    /// Recovery notice from `open`, handed out once
    pub(crate) fn take_warning(&mut self) -> Option<String> {
        self.warning.take()
    }

    pub(crate) fn add_record(
        &mut self,
        session: &Session,
        input: CargoInput,
    ) -> Result<Vec<CargoRecord>, CargoError> {
        self.add_record_at(session, input, Utc::now())
    }

    /// Validate, then append `quantity` unit records of one kind.
    ///
    /// The input weight is the batch total; each unit carries its share.
    pub(crate) fn add_record_at(
        &mut self,
        session: &Session,
        input: CargoInput,
        now: DateTime<Utc>,
    ) -> Result<Vec<CargoRecord>, CargoError> {
        self.limits.validate(&input)?;
        let CargoInput {
            cargo_type,
            dimensions,
            weight,
            quantity,
            packaging,
            photos,
        } = input;

        let unit_weight = weight / f64::from(quantity);
        let volume = dimensions.volume_m3();
        let key = group_key(cargo_type, dimensions, unit_weight, packaging, quantity, photos.len());
        let names: Vec<String> = photos.iter().map(|p| p.name.clone()).collect();

        let batch_id = self.next_id(now);
        let mut added = Vec::with_capacity(quantity as usize);
        for n in 0..quantity {
            let id = if n == 0 { batch_id } else { self.next_id(now) };
            added.push(CargoRecord {
                id,
                cargo_type,
                dimensions,
                weight: unit_weight,
                volume,
                packaging,
                photos: names.clone(),
                quantity: 1,
                batch_quantity: quantity,
                batch_id,
                group_key: key.clone(),
                employee_id: session.id.clone(),
                timestamp: now,
            });
        }
        self.records.extend(added.iter().cloned());
        if !photos.is_empty() {
            self.photos.insert(batch_id, photos);
            self.photos_dirty = true;
        }
        info!(count = added.len(), group = %key, "cargo added");

        self.persist()?;
        Ok(added)
    }

    pub(crate) fn remove_by_id(&mut self, id: u64) -> Result<usize, CargoError> {
        self.remove_where(|r| r.id == id)
    }

    pub(crate) fn remove_by_group_key(&mut self, key: &str) -> Result<usize, CargoError> {
        self.remove_where(|r| r.group_key == key)
    }

    pub(crate) fn clear(&mut self) -> Result<usize, CargoError> {
        self.remove_where(|_| true)
    }

    /// Retry writing the in-memory list
    pub(crate) fn flush(&mut self) -> Result<(), CargoError> {
        self.persist()
    }

    pub(crate) fn aggregate(&self) -> Totals {
        aggregate(&self.records)
    }

    pub(crate) fn group_by_key(&self) -> Vec<GroupSummary> {
        group_by_key(&self.records)
    }

    pub(crate) fn group(&self, key: &str) -> Option<GroupSummary> {
        self.group_by_key().into_iter().find(|g| g.group_key == key)
    }

    pub(crate) fn send_and_reset(&mut self, session: &Session) -> Result<ShipmentSnapshot, CargoError> {
        self.send_and_reset_at(session, Utc::now())
    }

    /// Snapshot the list into the history and empty it.
    ///
    /// History and list are written in one batch; on failure neither the
    /// store nor this struct changes.
    pub(crate) fn send_and_reset_at(
        &mut self,
        session: &Session,
        now: DateTime<Utc>,
    ) -> Result<ShipmentSnapshot, CargoError> {
        if self.records.is_empty() {
            return Err(CargoError::EmptyShipment);
        }

        let snapshot =
            ShipmentSnapshot::capture(session, self.records.clone(), self.photos.clone(), now);
        let mut history = self.history.clone();
        history.push(snapshot.clone());

        let ops = [
            KvOp::set(HISTORY_KEY, serde_json::to_string(&history)?),
            KvOp::set(CARGO_LIST_KEY, "[]".to_string()),
            KvOp::remove(PHOTOS_KEY),
        ];
        self.kv.apply(&ops).map_err(|e| {
            warn!(error = %e, "shipment not sent");
            CargoError::SendFailed(e)
        })?;

        self.history = history;
        self.records.clear();
        self.photos.clear();
        self.photos_dirty = false;
        info!(id = %snapshot.id, places = snapshot.totals.total_places, "shipment sent");
        Ok(snapshot)
    }

    fn remove_where(&mut self, matches: impl Fn(&CargoRecord) -> bool) -> Result<usize, CargoError> {
        let before = self.records.len();
        self.records.retain(|r| !matches(r));
        let removed = before - self.records.len();

        let live: HashSet<u64> = self.records.iter().map(|r| r.batch_id).collect();
        let batches = self.photos.len();
        self.photos.retain(|batch, _| live.contains(batch));
        if self.photos.len() != batches {
            self.photos_dirty = true;
        }
        debug!(removed, "cargo removed");
        self.persist()?;
        Ok(removed)
    }

    fn persist(&mut self) -> Result<(), CargoError> {
        let mut ops = vec![KvOp::set(CARGO_LIST_KEY, serde_json::to_string(&self.records)?)];
        if self.photos_dirty {
            ops.push(if self.photos.is_empty() {
                KvOp::remove(PHOTOS_KEY)
            } else {
                KvOp::set(PHOTOS_KEY, serde_json::to_string(&self.photos)?)
            });
        }
        self.kv.apply(&ops).map_err(|e| {
            warn!(error = %e, "cargo list kept in memory only");
            CargoError::Persistence(e)
        })?;
        self.photos_dirty = false;
        Ok(())
    }

    fn next_id(&mut self, now: DateTime<Utc>) -> u64 {
        let millis = u64::try_from(now.timestamp_millis()).unwrap_or(0);
        self.last_id = millis.max(self.last_id + 1);
        self.last_id
    }
}

fn load_or_default<T: DeserializeOwned + Default>(
    kv: &dyn KvStore,
    key: &str,
    warnings: &mut Vec<String>,
) -> Result<T, StorageError> {
    let Some(raw) = kv.get(key)? else {
        return Ok(T::default());
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(value),
        Err(e) => {
            warn!(key, error = %e, "stored value is malformed, starting empty");
            warnings.push(format!("stored {key} was unreadable and has been reset"));
            Ok(T::default())
        }
    }
}
