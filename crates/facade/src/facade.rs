//! Translation between external addresses and the simulation's points.

use crate::address::{AddressResolver, PointAddress};
use crate::types::{GetResponse, Pair, SetResponse, StatusResponse};
use crate::FacadeError;
use chrono::{DateTime, Local};
use simbridge_core::{RunState, SimulationRunner};
use simbridge_types::{PointCatalog, PointProperties};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Serves point reads and writes for one simulation run.
///
/// Reads come from the runner's state cache and never wait on a tick.
/// Writes go to its write buffer and take effect on the next tick at the
/// earliest.
pub struct PointFacade {
    runner: Arc<SimulationRunner>,
    resolver: AddressResolver,
}

impl PointFacade {
    /// Create a facade for the runner's case, accepting addresses with `scheme`.
    pub fn new(runner: Arc<SimulationRunner>, scheme: impl Into<String>) -> Self {
        let resolver = AddressResolver::new(
            scheme,
            runner.config().name.clone(),
            runner.case_id().to_string(),
        );
        Self { runner, resolver }
    }

    /// The address resolver in use.
    pub fn resolver(&self) -> &AddressResolver {
        &self.resolver
    }

    /// The runner behind this facade.
    pub fn runner(&self) -> &Arc<SimulationRunner> {
        &self.runner
    }

    /// Read the current values of the addressed points.
    ///
    /// Any malformed address fails the whole request. Points the simulation
    /// does not report are left out of the response.
    pub fn get(&self, keys: &[String]) -> Result<GetResponse, FacadeError> {
        let addresses = self.resolve_all(keys.iter().map(String::as_str))?;
        debug!(num_keys = addresses.len(), "Get request received");

        let points: Vec<&str> = addresses.iter().map(PointAddress::point).collect();
        let values = self.runner.cache().get_multiple(&points);

        let pairs = addresses
            .iter()
            .filter_map(|address| {
                values.get(address.point()).map(|value| Pair {
                    key: address.as_str().to_string(),
                    value: value.clone(),
                })
            })
            .collect();

        Ok(GetResponse {
            time: self.simulated_time(),
            pairs,
        })
    }

    /// Queue writes for the next tick.
    ///
    /// Every address is validated before anything is queued, so a request
    /// with one bad address queues nothing. Once the run starts stopping the
    /// whole request is refused; an acknowledged request was queued whole
    /// before that.
    pub fn set(&self, pairs: Vec<Pair>) -> Result<SetResponse, FacadeError> {
        let addresses = self.resolve_all(pairs.iter().map(|p| p.key.as_str()))?;
        let writes = addresses
            .iter()
            .zip(&pairs)
            .map(|(address, pair)| (address.point().to_string(), pair.value.clone()));
        if !self.runner.writes().set_all(writes) {
            let state = match self.runner.state() {
                RunState::Stopped => RunState::Stopped,
                _ => RunState::Stopping,
            };
            return Err(FacadeError::RunUnavailable(state.to_string()));
        }
        info!(num_pairs = pairs.len(), "Set request queued");

        Ok(SetResponse { pairs })
    }

    /// Metadata of all measurement points, keyed by external address.
    pub async fn measurements(&self) -> Result<BTreeMap<String, PointProperties>, FacadeError> {
        let catalog = self
            .runner
            .service()
            .measurements(self.runner.case_id())
            .await?;
        Ok(self.externalize(catalog))
    }

    /// Metadata of all input points, keyed by external address.
    pub async fn inputs(&self) -> Result<BTreeMap<String, PointProperties>, FacadeError> {
        let catalog = self.runner.service().inputs(self.runner.case_id()).await?;
        Ok(self.externalize(catalog))
    }

    /// Start the run if it has not started yet.
    pub async fn start(&self) -> Result<StatusResponse, FacadeError> {
        self.runner.start().await?;
        Ok(self.status())
    }

    /// Change the simulated step size.
    pub async fn set_step(&self, seconds: u64) -> Result<StatusResponse, FacadeError> {
        if seconds == 0 {
            return Err(FacadeError::InvalidStep(seconds));
        }
        self.runner.set_step(seconds).await?;
        Ok(self.status())
    }

    /// Lifecycle and step of the run.
    pub fn status(&self) -> StatusResponse {
        StatusResponse {
            test_case: self.runner.config().name.clone(),
            case_id: self.runner.case_id().to_string(),
            state: self.runner.state(),
            step: self.runner.step(),
            pending_writes: self.runner.writes().len(),
        }
    }

    /// Simulated time of the cached snapshot, or wall-clock time when the
    /// simulation has not reported one yet.
    fn simulated_time(&self) -> DateTime<Local> {
        match self.runner.cache().current_time() {
            Ok(time) => time,
            Err(err) => {
                warn!(error = %err, "No simulated time available, using wall-clock time");
                Local::now()
            }
        }
    }

    fn resolve_all<'a>(
        &self,
        keys: impl Iterator<Item = &'a str>,
    ) -> Result<Vec<PointAddress>, FacadeError> {
        keys.map(|key| self.resolver.resolve(key)).collect()
    }

    fn externalize(&self, catalog: PointCatalog) -> BTreeMap<String, PointProperties> {
        catalog
            .into_iter()
            .map(|(point, properties)| (self.resolver.external(&point), properties))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeDelta, TimeZone};
    use simbridge_client::testing::MockSimulation;
    use simbridge_types::{Snapshot, TestCaseConfig, Value};
    use tracing_test::traced_test;

    async fn facade_with(snapshot: &[(&str, Value)]) -> (PointFacade, Arc<MockSimulation>) {
        let sim = Arc::new(MockSimulation::new());
        let runner = SimulationRunner::connect(sim.clone(), TestCaseConfig::new("bestest_air"))
            .await
            .unwrap();
        runner.cache().replace_all(
            snapshot
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect::<Snapshot>(),
        );
        (PointFacade::new(Arc::new(runner), "sim"), sim)
    }

    fn keys(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|k| k.to_string()).collect()
    }

    #[tokio::test]
    async fn test_get_keys_by_original_address() {
        let (facade, _) = facade_with(&[
            ("time", Value::Number(3600.0)),
            ("zon_reaTRooAir_y", Value::Number(293.4)),
        ])
        .await;

        let response = facade
            .get(&keys(&["sim://bestest_air/zon_reaTRooAir_y"]))
            .unwrap();
        assert_eq!(
            response.pairs,
            vec![Pair {
                key: "sim://bestest_air/zon_reaTRooAir_y".to_string(),
                value: Value::Number(293.4),
            }]
        );

        let year_start = Local
            .with_ymd_and_hms(Local::now().year(), 1, 1, 0, 0, 0)
            .earliest()
            .unwrap();
        assert_eq!(response.time, year_start + TimeDelta::hours(1));
    }

    #[tokio::test]
    async fn test_get_omits_unknown_points() {
        let (facade, _) = facade_with(&[
            ("time", Value::Number(0.0)),
            ("zon_reaTRooAir_y", Value::Number(293.4)),
            ("oveTSetHea_u", Value::Number(294.0)),
        ])
        .await;

        let response = facade
            .get(&keys(&[
                "sim://bestest_air/oveTSetHea_u",
                "sim://bestest_air/not_a_point",
                "sim://bestest_air/zon_reaTRooAir_y",
            ]))
            .unwrap();

        let returned: Vec<&str> = response.pairs.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(
            returned,
            vec![
                "sim://bestest_air/oveTSetHea_u",
                "sim://bestest_air/zon_reaTRooAir_y"
            ]
        );
    }

    #[tokio::test]
    async fn test_get_accepts_case_id_segment() {
        let (facade, _) = facade_with(&[("zon_reaTRooAir_y", Value::Number(293.4))]).await;
        let address = format!(
            "sim://{}/zon_reaTRooAir_y",
            facade.runner().case_id()
        );

        let response = facade.get(&[address.clone()]).unwrap();
        assert_eq!(response.pairs[0].key, address);
    }

    #[tokio::test]
    async fn test_get_rejects_malformed_address() {
        let (facade, _) = facade_with(&[("zon_reaTRooAir_y", Value::Number(293.4))]).await;

        let err = facade
            .get(&keys(&["sim://bestest_air/zon_reaTRooAir_y", "zon_reaTRooAir_y"]))
            .unwrap_err();
        assert!(matches!(err, FacadeError::InvalidAddress { ref address, .. } if address == "zon_reaTRooAir_y"));
    }

    #[traced_test]
    #[tokio::test]
    async fn test_get_falls_back_to_wall_clock() {
        let (facade, _) = facade_with(&[("zon_reaTRooAir_y", Value::Number(293.4))]).await;

        let before = Local::now();
        let response = facade
            .get(&keys(&["sim://bestest_air/zon_reaTRooAir_y"]))
            .unwrap();
        assert!(response.time >= before);
        assert_eq!(response.pairs.len(), 1);
        assert!(logs_contain("No simulated time available"));
    }

    #[tokio::test]
    async fn test_set_queues_internal_names() {
        let (facade, _) = facade_with(&[("oveTSetHea_u", Value::Number(294.0))]).await;

        let pairs = vec![
            Pair {
                key: "sim://bestest_air/oveTSetHea_u".to_string(),
                value: Value::Number(296.0),
            },
            Pair {
                key: "sim://bestest_air/oveTSetHea_activate".to_string(),
                value: Value::Number(1.0),
            },
        ];
        let ack = facade.set(pairs.clone()).unwrap();
        assert_eq!(ack.pairs, pairs);

        // Not applied synchronously.
        assert_eq!(
            facade.runner().cache().get("oveTSetHea_u"),
            Some(Value::Number(294.0))
        );

        let pending = facade.runner().writes().flush();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending["oveTSetHea_u"], Value::Number(296.0));
        assert_eq!(pending["oveTSetHea_activate"], Value::Number(1.0));
    }

    #[tokio::test]
    async fn test_set_with_bad_address_queues_nothing() {
        let (facade, _) = facade_with(&[]).await;

        let err = facade
            .set(vec![
                Pair {
                    key: "sim://bestest_air/oveTSetHea_u".to_string(),
                    value: Value::Number(296.0),
                },
                Pair {
                    key: "other://bestest_air/oveTSetHea_u".to_string(),
                    value: Value::Number(296.0),
                },
            ])
            .unwrap_err();
        assert!(matches!(err, FacadeError::InvalidAddress { .. }));
        assert!(facade.runner().writes().is_empty());
    }

    #[tokio::test]
    async fn test_set_after_stop_is_unavailable() {
        let (facade, _) = facade_with(&[]).await;
        facade.runner().stop().await;

        let err = facade
            .set(vec![Pair {
                key: "sim://bestest_air/oveTSetHea_u".to_string(),
                value: Value::Number(296.0),
            }])
            .unwrap_err();
        assert!(matches!(err, FacadeError::RunUnavailable(_)));
    }

    #[tokio::test]
    async fn test_set_refused_after_advance_failure() {
        let sim = Arc::new(MockSimulation::new().fail_advance_at(1));
        let config = TestCaseConfig::new("bestest_air")
            .with_update_frequency(std::time::Duration::from_millis(10));
        let runner = SimulationRunner::connect(sim.clone(), config).await.unwrap();
        let facade = PointFacade::new(Arc::new(runner), "sim");
        facade.start().await.unwrap();

        let mut states = facade.runner().subscribe();
        states.wait_for(|s| s.is_terminal()).await.unwrap();

        let err = facade
            .set(vec![Pair {
                key: "sim://bestest_air/oveTSetHea_u".to_string(),
                value: Value::Number(296.0),
            }])
            .unwrap_err();
        assert!(matches!(err, FacadeError::RunUnavailable(ref state) if state == "stopped"));
        assert!(facade.runner().writes().is_empty());
    }

    #[traced_test]
    #[tokio::test]
    async fn test_get_falls_back_when_time_out_of_range() {
        let (facade, _) = facade_with(&[
            ("time", Value::Number(1e18)),
            ("zon_reaTRooAir_y", Value::Number(293.4)),
        ])
        .await;

        let before = Local::now();
        let response = facade
            .get(&keys(&["sim://bestest_air/zon_reaTRooAir_y"]))
            .unwrap();
        assert!(response.time >= before);
        assert_eq!(response.pairs.len(), 1);
        assert!(logs_contain("out of range"));
    }

    #[tokio::test]
    async fn test_metadata_keyed_by_external_address() {
        let (facade, _) = facade_with(&[]).await;

        let measurements = facade.measurements().await.unwrap();
        assert_eq!(
            measurements.keys().collect::<Vec<_>>(),
            vec!["sim://bestest_air/zon_reaTRooAir_y"]
        );

        let inputs = facade.inputs().await.unwrap();
        let heating = &inputs["sim://bestest_air/oveTSetHea_u"];
        assert_eq!(heating.unit.as_deref(), Some("K"));
        assert_eq!(heating.maximum, Some(308.15));
    }

    #[tokio::test]
    async fn test_start_and_step_control() {
        let (facade, sim) = facade_with(&[]).await;

        let status = facade.set_step(900).await.unwrap();
        assert_eq!(status.step, 900);
        assert_eq!(sim.current_step(), 900);
        assert!(matches!(
            facade.set_step(0).await,
            Err(FacadeError::InvalidStep(0))
        ));

        let status = facade.start().await.unwrap();
        assert_eq!(status.state, RunState::Running);
        assert!(facade.runner().cache().current_time().is_ok());

        facade.runner().stop().await;
        assert!(matches!(
            facade.start().await,
            Err(FacadeError::RunUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_status() {
        let (facade, _) = facade_with(&[]).await;
        facade.runner().set_input("oveTSetHea_u", Value::Number(296.0));

        let status = facade.status();
        assert_eq!(status.test_case, "bestest_air");
        assert_eq!(status.state, RunState::Created);
        assert_eq!(status.step, 60);
        assert_eq!(status.pending_writes, 1);
    }
}
