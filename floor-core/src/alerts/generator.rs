//! Alert Generator
//!
//! Derives notifications from stock and order state. Each alertable
//! condition has a key (`stock:critical:{id}`, `stock:expiring:{id}`,
//! `stock:expired:{id}`, `orders:sla:{id}`) recorded in `alert_keys` while
//! open:
//!
//! - condition holds, key absent: raise a notification, record the key
//! - condition holds, key present: nothing
//! - condition cleared, key present: mark the notification resolved, drop the key
//!
//! Dismissing deletes the notification but keeps its key, so a condition
//! that still holds is not raised again.
//! Resolved notifications are purged once older than seven days.

use crate::core::config::FloorPolicy;
use crate::db::{FloorStore, NOTIFICATIONS, ORDERS, STOCK_ITEMS, TxRead, TxWrite};
use crate::stock::forecast;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{
    ExpiryState, Notification, NotificationCategory, NotificationFilter, NotificationPriority,
    NotificationSettings, NotificationType, Order, StockItem, StockLevel,
};
use shared::util::snowflake_id;
use std::collections::{BTreeMap, HashMap};

const SETTINGS_KEY: &str = "notification_settings";
const MS_PER_MINUTE: i64 = 60_000;
/// Resolved notifications older than this are purged on refresh
const RESOLVED_RETENTION_MS: i64 = 7 * 24 * 60 * MS_PER_MINUTE;

/// A notification that should exist for an open condition
#[derive(Debug, Clone)]
struct Draft {
    category: NotificationCategory,
    kind: NotificationType,
    priority: NotificationPriority,
    title: String,
    message: String,
    action_required: bool,
}

impl Draft {
    fn into_notification(self, subject: String, now_millis: i64) -> Notification {
        Notification {
            id: snowflake_id(),
            category: self.category,
            kind: self.kind,
            priority: self.priority,
            title: self.title,
            message: self.message,
            is_read: false,
            action_required: self.action_required,
            subject,
            created_at: now_millis,
            resolved_at: None,
        }
    }
}

/// Outcome of one refresh pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshReport {
    pub raised: usize,
    pub resolved: usize,
    pub purged: usize,
}

#[derive(Clone)]
pub struct AlertGenerator {
    store: FloorStore,
    expiry_warning_days: i64,
    order_sla_minutes: i64,
    takeaway_sla_minutes: i64,
}

impl AlertGenerator {
    pub fn new(store: FloorStore, policy: &FloorPolicy) -> Self {
        Self {
            store,
            expiry_warning_days: policy.expiry_warning_days,
            order_sla_minutes: policy.order_sla_minutes,
            takeaway_sla_minutes: policy.takeaway_sla_minutes,
        }
    }

    fn stock_conditions(
        &self,
        item: &StockItem,
        now_millis: i64,
        out: &mut BTreeMap<String, Draft>,
    ) {
        let f = forecast::forecast(item, now_millis, self.expiry_warning_days);

        if f.level == StockLevel::Critical {
            out.insert(
                format!("stock:critical:{}", item.id),
                Draft {
                    category: NotificationCategory::Stock,
                    kind: NotificationType::Error,
                    priority: NotificationPriority::High,
                    title: "Critical stock".into(),
                    message: format!(
                        "{} is at {} {} (minimum {})",
                        item.name, item.current_stock, item.unit, item.min_stock
                    ),
                    action_required: true,
                },
            );
        }

        match f.expiry {
            ExpiryState::ExpiringSoon(days) => {
                out.insert(
                    format!("stock:expiring:{}", item.id),
                    Draft {
                        category: NotificationCategory::Stock,
                        kind: NotificationType::Warning,
                        priority: NotificationPriority::Medium,
                        title: "Expiring soon".into(),
                        message: format!("{} expires in {} day(s)", item.name, days),
                        action_required: false,
                    },
                );
            }
            ExpiryState::Expired(days_ago) => {
                out.insert(
                    format!("stock:expired:{}", item.id),
                    Draft {
                        category: NotificationCategory::Stock,
                        kind: NotificationType::Error,
                        priority: NotificationPriority::High,
                        title: "Expired".into(),
                        message: format!("{} expired {} day(s) ago", item.name, days_ago),
                        action_required: true,
                    },
                );
            }
            ExpiryState::NoExpiry | ExpiryState::Fresh(_) => {}
        }
    }

    fn order_condition(&self, order: &Order, now_millis: i64, out: &mut BTreeMap<String, Draft>) {
        if order.status.is_terminal() {
            return;
        }
        let sla = if order.is_takeaway() {
            self.takeaway_sla_minutes
        } else {
            self.order_sla_minutes
        };
        let age_millis = now_millis - order.created_at;
        if age_millis <= sla * MS_PER_MINUTE {
            return;
        }
        let age_minutes = age_millis / MS_PER_MINUTE;
        out.insert(
            format!("orders:sla:{}", order.id),
            Draft {
                category: NotificationCategory::Orders,
                kind: NotificationType::Warning,
                priority: NotificationPriority::High,
                title: "Order delayed".into(),
                message: format!(
                    "Order {} has been {} for {} minutes",
                    order.order_number, order.status, age_minutes
                ),
                action_required: true,
            },
        );
    }

    /// Recompute every condition and reconcile notifications
    pub fn refresh(&self, now_millis: i64) -> AppResult<RefreshReport> {
        let report = self.store.write(|txn| {
            let settings: NotificationSettings = txn.setting(SETTINGS_KEY)?.unwrap_or_default();

            let mut wanted = BTreeMap::new();
            if settings.is_enabled(NotificationCategory::Stock) {
                for item in txn.records::<StockItem>(STOCK_ITEMS)? {
                    self.stock_conditions(&item, now_millis, &mut wanted);
                }
            }
            if settings.is_enabled(NotificationCategory::Orders) {
                for id in txn.active_order_ids()? {
                    if let Some(order) = txn.record::<Order>(ORDERS, id)? {
                        self.order_condition(&order, now_millis, &mut wanted);
                    }
                }
            }

            let open: HashMap<String, i64> = txn.alert_keys()?.into_iter().collect();
            let mut report = RefreshReport::default();

            for (key, notification_id) in &open {
                if wanted.contains_key(key) {
                    continue;
                }
                let existing = txn.record::<Notification>(NOTIFICATIONS, *notification_id)?;
                // keys of disabled categories stay open until re-enabled
                let category_enabled = existing
                    .as_ref()
                    .map(|n| settings.is_enabled(n.category))
                    .unwrap_or_else(|| !key_category_disabled(key, &settings));
                if !category_enabled {
                    continue;
                }
                if let Some(mut n) = existing {
                    n.resolved_at = Some(now_millis);
                    txn.put(NOTIFICATIONS, n.id, &n)?;
                }
                txn.clear_alert_key(key)?;
                report.resolved += 1;
            }

            for (key, draft) in wanted {
                if open.contains_key(&key) {
                    continue;
                }
                let notification = draft.into_notification(key.clone(), now_millis);
                txn.put(NOTIFICATIONS, notification.id, &notification)?;
                txn.set_alert_key(&key, notification.id)?;
                report.raised += 1;
            }

            let cutoff = now_millis - RESOLVED_RETENTION_MS;
            for n in txn.records::<Notification>(NOTIFICATIONS)? {
                if n.resolved_at.is_some_and(|at| at < cutoff) {
                    txn.delete(NOTIFICATIONS, n.id)?;
                    report.purged += 1;
                }
            }
            Ok(report)
        })?;

        if report != RefreshReport::default() {
            tracing::info!(
                raised = report.raised,
                resolved = report.resolved,
                purged = report.purged,
                "Alerts refreshed"
            );
        }
        Ok(report)
    }

    /// Newest first
    pub fn list(&self, filter: &NotificationFilter) -> AppResult<Vec<Notification>> {
        let mut notifications: Vec<Notification> =
            self.store.read(|txn| Ok(txn.records(NOTIFICATIONS)?))?;
        notifications.retain(|n| {
            filter.category.is_none_or(|c| n.category == c)
                && (!filter.unread_only || !n.is_read)
                && (filter.include_resolved || n.is_open())
        });
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(notifications)
    }

    pub fn mark_read(&self, notification_id: i64) -> AppResult<Notification> {
        self.store.write(|txn| {
            let mut n: Notification = txn
                .record(NOTIFICATIONS, notification_id)?
                .ok_or_else(|| AppError::for_id(ErrorCode::NotificationNotFound, notification_id))?;
            n.is_read = true;
            txn.put(NOTIFICATIONS, notification_id, &n)?;
            Ok(n)
        })
    }

    /// Returns how many notifications changed
    pub fn mark_all_read(&self) -> AppResult<usize> {
        self.store.write(|txn| {
            let mut changed = 0;
            for mut n in txn.records::<Notification>(NOTIFICATIONS)? {
                if !n.is_read {
                    n.is_read = true;
                    txn.put(NOTIFICATIONS, n.id, &n)?;
                    changed += 1;
                }
            }
            Ok(changed)
        })
    }

    pub fn dismiss(&self, notification_id: i64) -> AppResult<()> {
        self.store.write(|txn| {
            if !txn.delete(NOTIFICATIONS, notification_id)? {
                return Err(AppError::for_id(
                    ErrorCode::NotificationNotFound,
                    notification_id,
                ));
            }
            Ok(())
        })?;
        tracing::debug!(notification_id, "Notification dismissed");
        Ok(())
    }

    /// Open, unread notifications
    pub fn unread_count(&self) -> AppResult<usize> {
        let notifications: Vec<Notification> =
            self.store.read(|txn| Ok(txn.records(NOTIFICATIONS)?))?;
        Ok(notifications
            .iter()
            .filter(|n| n.is_open() && !n.is_read)
            .count())
    }

    pub fn settings(&self) -> AppResult<NotificationSettings> {
        self.store
            .read(|txn| Ok(txn.setting(SETTINGS_KEY)?.unwrap_or_default()))
    }

    pub fn update_settings(
        &self,
        settings: NotificationSettings,
    ) -> AppResult<NotificationSettings> {
        self.store
            .write(|txn| Ok(txn.put_setting(SETTINGS_KEY, &settings)?))?;
        tracing::info!(?settings, "Notification settings updated");
        Ok(settings)
    }
}

/// Category of a dangling key, judged by its prefix
fn key_category_disabled(key: &str, settings: &NotificationSettings) -> bool {
    let category = match key.split(':').next() {
        Some("stock") => NotificationCategory::Stock,
        Some("orders") => NotificationCategory::Orders,
        _ => return false,
    };
    !settings.is_enabled(category)
}
