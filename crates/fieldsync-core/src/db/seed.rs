//! Demo task set written on first launch

use crate::models::{BusinessStatus, SyncStatus, Task, TaskId, TaskLocation};

/// Number of demo tasks
pub const SEED_TASK_COUNT: usize = 40;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;
const BASE_LATITUDE: f64 = 19.4326;
const BASE_LONGITUDE: f64 = -99.1332;

const TITLES: [&str; 10] = [
    "Audit Coca-Cola Shelf",
    "Audit Snacks Aisle",
    "Verify Dairy Prices",
    "Check Beverage Promotions",
    "Review Frozen Foods Display",
    "Validate Pharmacy Endcap",
    "Inspect Personal Care Section",
    "Count Seasonal Inventory",
    "Capture Checkout Display",
    "Verify Cleaning Products Placement",
];

const STORES: [&str; 6] = [
    "Walmart Buenavista",
    "Walmart Reforma",
    "Walmart Coyoacan",
    "Walmart Polanco",
    "Walmart Santa Fe",
    "Walmart Tezontle",
];

/// Build the demo tasks, all `available` and already synced at version 1
#[allow(clippy::cast_precision_loss, clippy::cast_possible_wrap)]
pub fn demo_tasks(now: i64) -> Vec<Task> {
    (0..SEED_TASK_COUNT)
        .map(|index| {
            let spread = (index % 8) as f64;
            Task {
                id: TaskId::new(format!("seed_task_{:03}", index + 1)),
                title: TITLES[index % TITLES.len()].to_string(),
                price: 40.0 + (index % 7) as f64 * 5.0,
                business_status: BusinessStatus::Available,
                sync_status: SyncStatus::Synced,
                location: TaskLocation {
                    latitude: BASE_LATITUDE + spread * 0.0021,
                    longitude: BASE_LONGITUDE - spread * 0.0019,
                    address: STORES[index % STORES.len()].to_string(),
                },
                image_ref: None,
                expires_at: now + (15 + (index % 10) as i64) * DAY_MS,
                notes: String::new(),
                server_version: 1,
                updated_at: now,
                last_synced_at: Some(now),
            }
        })
        .collect()
}
