//! The simulation ticker: the engine's only autonomous, time-driven behavior.
//!
//! A single background task fires on a fixed period and, per tick, advances
//! every en-route rescue team toward its victim, flips arrivals to
//! `Rescued`, and purges incidents that have been rescued for longer than
//! the retention window. `Resolved` incidents are deliberately never purged
//! here; they persist until an operator deletes them.
//!
//! The whole tick body runs synchronously inside one store lock, so ticks
//! cannot overlap each other or interleave with request handling. The pure
//! core ([`tick_once`]) takes the clock as an argument, which keeps the
//! rules testable with synthetic time.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::model::{SosStatus, TeamStatus};
use crate::store::{IncidentStore, StoreInner};

/// Teams within this many degrees of the victim on both axes have arrived
/// (~22 m at the equator).
const ARRIVAL_THRESHOLD_DEG: f64 = 0.0002;

/// Fraction of the remaining delta a team covers per tick. An exponential
/// approach that never reaches the target by arithmetic alone, hence the
/// arrival threshold above.
const APPROACH_FACTOR: f64 = 0.05;

/// Rescued incidents are purged this many seconds after `resolved_at`.
const PURGE_AFTER_SECS: i64 = 10;

/// Degrees-to-km approximation for the ETA readout. Deliberately cheap;
/// the dashboard only needs a coarse countdown, not Haversine accuracy.
const DEG_TO_KM: f64 = 111.0;

/// ETA speed constant: 2 minutes per remaining km (0.5 km/min).
const ETA_MINUTES_PER_KM: f64 = 2.0;

/// Run one simulation tick against the store at the given instant.
///
/// Public so tests (and a hypothetical manual-step tool) can drive the
/// simulation without real sleeping.
pub fn tick_once(store: &IncidentStore, now: DateTime<Utc>) {
    store.with_inner(|inner| advance(inner, now));
}

/// The tick body, applied under the store lock.
fn advance(inner: &mut StoreInner, now: DateTime<Utc>) {
    for sos in inner.signals.iter_mut() {
        // A signal can reach Rescued without passing through the ticker
        // (operator tooling writing straight to the store); stamp the
        // rescue time on first sight so the retention window still starts.
        if sos.status == SosStatus::Rescued && sos.resolved_at.is_none() {
            sos.resolved_at = Some(now);
        }

        let Some(team) = sos.assigned_team.as_mut() else {
            continue;
        };
        if team.status != TeamStatus::EnRoute {
            continue;
        }

        let d_lat = sos.lat - team.lat;
        let d_lng = sos.lng - team.lng;

        if d_lat.abs() < ARRIVAL_THRESHOLD_DEG && d_lng.abs() < ARRIVAL_THRESHOLD_DEG {
            team.status = TeamStatus::OnSite;
            sos.status = SosStatus::Rescued;
            sos.resolved_at = Some(now);
            info!(team = %team.name, sos = %sos.id, "rescue team reached victim");
        } else {
            team.lat += d_lat * APPROACH_FACTOR;
            team.lng += d_lng * APPROACH_FACTOR;

            let dist_km = (d_lat * d_lat + d_lng * d_lng).sqrt() * DEG_TO_KM;
            team.eta = Some(format!("{} mins", (dist_km * ETA_MINUTES_PER_KM).ceil() as i64));
        }
    }

    // Purge in one pass after the scan. Identity-based retain, so removal
    // order doesn't matter.
    inner.signals.retain(|sos| {
        let purge = sos.status == SosStatus::Rescued
            && sos
                .resolved_at
                .is_some_and(|t| now.signed_duration_since(t) > chrono::Duration::seconds(PURGE_AFTER_SECS));
        if purge {
            info!(sos = %sos.id, "purging rescued incident");
        }
        !purge
    });
}

/// Handle to the running simulation task.
pub struct Ticker {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Ticker {
    /// Spawn the simulation loop with the given tick period.
    ///
    /// The task runs until [`Ticker::shutdown`] is called; it holds its own
    /// clone of the store handle.
    pub fn spawn(store: IncidentStore, period: Duration) -> Self {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        tick_once(&store, Utc::now());
                    }
                    _ = shutdown_rx.changed() => {
                        debug!("simulation ticker stopping");
                        break;
                    }
                }
            }
        });

        Self { shutdown_tx, handle }
    }

    /// Stop the simulation loop and wait for the in-flight tick to drain.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.handle.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NewSos, Priority, RescueTeam, SosUpdate};

    fn store_with_assigned_team(victim_lat: f64, victim_lng: f64) -> (IncidentStore, String) {
        let store = IncidentStore::new();
        let sos = store.add_sos(NewSos {
            lat: victim_lat,
            lng: victim_lng,
            message: "trapped on the roof".to_string(),
            battery: 60,
            is_offline: false,
            priority: Priority::High,
            category: "Trapped/Rising Water".to_string(),
            audio_url: None,
            is_battery_optimized: None,
        });

        store.update_sos(
            &sos.id,
            SosUpdate {
                status: Some(SosStatus::Assigned),
                assigned_team: Some(RescueTeam {
                    id: "TEAM-TEST".to_string(),
                    name: "Alpha".to_string(),
                    lat: victim_lat - 0.05,
                    lng: victim_lng - 0.05,
                    status: TeamStatus::EnRoute,
                    eta: Some("12 mins".to_string()),
                }),
                ..SosUpdate::default()
            },
        );

        (store, sos.id)
    }

    fn team_distance(store: &IncidentStore, id: &str) -> f64 {
        let sos = store.get_sos(id).unwrap();
        let team = sos.assigned_team.unwrap();
        let d_lat = sos.lat - team.lat;
        let d_lng = sos.lng - team.lng;
        (d_lat * d_lat + d_lng * d_lng).sqrt()
    }

    #[test]
    fn test_team_approaches_monotonically() {
        let (store, id) = store_with_assigned_team(28.6139, 77.2090);
        let now = Utc::now();

        let mut prev = team_distance(&store, &id);
        for _ in 0..20 {
            tick_once(&store, now);
            let dist = team_distance(&store, &id);
            assert!(dist < prev, "distance must strictly decrease ({dist} >= {prev})");
            prev = dist;
        }

        // Still en route after 20 ticks from 0.05 degrees out.
        let sos = store.get_sos(&id).unwrap();
        assert_eq!(sos.status, SosStatus::Assigned);
        assert_eq!(sos.assigned_team.unwrap().status, TeamStatus::EnRoute);
    }

    #[test]
    fn test_eta_recomputed_while_en_route() {
        let (store, id) = store_with_assigned_team(28.6139, 77.2090);
        tick_once(&store, Utc::now());

        let team = store.get_sos(&id).unwrap().assigned_team.unwrap();
        let eta = team.eta.unwrap();
        assert!(eta.ends_with(" mins"), "got {eta}");
        // Placeholder "12 mins" must have been replaced: ~7.8 km out at
        // 2 min/km rounds up to 16.
        assert_eq!(eta, "16 mins");
    }

    #[test]
    fn test_arrival_flips_statuses_in_same_tick() {
        let (store, id) = store_with_assigned_team(28.6139, 77.2090);
        let now = Utc::now();

        // 5% exponential approach from 0.05 degrees needs ~115 ticks to get
        // under the 0.0002-degree threshold.
        for _ in 0..200 {
            tick_once(&store, now);
            if store.get_sos(&id).unwrap().status == SosStatus::Rescued {
                break;
            }
        }

        let sos = store.get_sos(&id).unwrap();
        assert_eq!(sos.status, SosStatus::Rescued);
        assert_eq!(sos.resolved_at, Some(now));
        assert_eq!(sos.assigned_team.unwrap().status, TeamStatus::OnSite);
    }

    #[test]
    fn test_rescued_purged_after_retention_window() {
        let (store, id) = store_with_assigned_team(28.6139, 77.2090);
        let rescued_at = Utc::now();

        store.update_sos(
            &id,
            SosUpdate {
                status: Some(SosStatus::Rescued),
                resolved_at: Some(rescued_at),
                ..SosUpdate::default()
            },
        );

        // Inside the window: still listed.
        tick_once(&store, rescued_at + chrono::Duration::seconds(9));
        assert!(store.get_sos(&id).is_some());

        // Past the window: gone.
        tick_once(&store, rescued_at + chrono::Duration::seconds(11));
        assert!(store.get_sos(&id).is_none());
    }

    #[test]
    fn test_rescued_without_timestamp_gets_stamped_before_purge() {
        let store = IncidentStore::new();
        let sos = store.add_sos(NewSos {
            lat: 0.0,
            lng: 0.0,
            message: "ok now".to_string(),
            battery: 50,
            is_offline: false,
            priority: Priority::Low,
            category: "General Assistance".to_string(),
            audio_url: None,
            is_battery_optimized: None,
        });
        store.update_sos(
            &sos.id,
            SosUpdate {
                status: Some(SosStatus::Rescued),
                ..SosUpdate::default()
            },
        );

        let t0 = Utc::now();
        tick_once(&store, t0);

        // First tick stamps the rescue time instead of purging.
        let stamped = store.get_sos(&sos.id).unwrap();
        assert_eq!(stamped.resolved_at, Some(t0));

        tick_once(&store, t0 + chrono::Duration::seconds(11));
        assert!(store.get_sos(&sos.id).is_none());
    }

    #[test]
    fn test_resolved_is_never_purged() {
        let store = IncidentStore::new();
        let sos = store.add_sos(NewSos {
            lat: 0.0,
            lng: 0.0,
            message: "safe".to_string(),
            battery: 50,
            is_offline: false,
            priority: Priority::Low,
            category: "General Assistance".to_string(),
            audio_url: None,
            is_battery_optimized: None,
        });
        let t0 = Utc::now();
        store.update_sos(
            &sos.id,
            SosUpdate {
                status: Some(SosStatus::Resolved),
                resolved_at: Some(t0),
                ..SosUpdate::default()
            },
        );

        tick_once(&store, t0 + chrono::Duration::hours(1));

        assert!(store.get_sos(&sos.id).is_some());
    }

    #[test]
    fn test_on_site_team_no_longer_moves() {
        let (store, id) = store_with_assigned_team(28.6139, 77.2090);
        let now = Utc::now();

        for _ in 0..200 {
            tick_once(&store, now);
            if store.get_sos(&id).unwrap().status == SosStatus::Rescued {
                break;
            }
        }

        let arrived = store.get_sos(&id).unwrap().assigned_team.unwrap();
        tick_once(&store, now);
        let after = store.get_sos(&id).unwrap().assigned_team.unwrap();

        assert_eq!(arrived.lat, after.lat);
        assert_eq!(arrived.lng, after.lng);
    }

    #[tokio::test]
    async fn test_spawned_ticker_advances_and_drains() {
        let (store, id) = store_with_assigned_team(28.6139, 77.2090);
        let start = team_distance(&store, &id);

        let ticker = Ticker::spawn(store.clone(), Duration::from_millis(10));

        // The first interval tick fires immediately, so a short sleep is
        // enough to observe movement.
        tokio::time::sleep(Duration::from_millis(100)).await;
        ticker.shutdown().await;

        assert!(team_distance(&store, &id) < start);
    }
}
