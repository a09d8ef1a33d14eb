use std::time::Duration;

use bon::Builder;
use chrono::{Local, NaiveDate};
use clap::Parser;
use tokio::{
    task::spawn_blocking,
    time::{MissedTickBehavior, interval},
};

use crate::{
    accumulator::Accumulator,
    api::heartbeat,
    cli::{
        heartbeat::HeartbeatArgs,
        home_assistant::HomeAssistantArgs,
        ledger::LedgerArgs,
        price::PriceArgs,
    },
    host::{SensorSink, StateSource, StatisticsSink},
    ledger::{Ingestion, Ledger},
    prelude::*,
    reading::DailyReading,
    sensor::Device,
    statistics::History,
};

#[derive(Parser)]
pub struct PollArgs {
    /// Entity with the reading date in the `DD/MM/YYYY` format.
    #[clap(long = "date-sensor", env = "DATE_SENSOR")]
    date_sensor: String,

    /// Entity with the daily consumption in kilowatt-hours.
    #[clap(long = "value-sensor", env = "VALUE_SENSOR")]
    value_sensor: String,

    /// Distinguishes the published sensors of several instances.
    #[clap(long = "instance-id", env = "INSTANCE_ID", default_value = "default")]
    instance_id: String,

    #[clap(long = "polling-interval", env = "POLLING_INTERVAL", default_value = "5min")]
    polling_interval: humantime::Duration,

    /// Run a single cycle and exit.
    #[clap(long)]
    once: bool,

    #[clap(flatten)]
    home_assistant: HomeAssistantArgs,

    #[clap(flatten)]
    price: PriceArgs,

    #[clap(flatten)]
    ledger: LedgerArgs,

    #[clap(flatten)]
    heartbeat: HeartbeatArgs,
}

impl PollArgs {
    pub async fn run(self) -> Result {
        let api = self.home_assistant.api()?;
        let importer = self.home_assistant.statistics_importer()?;
        let accumulator = Accumulator::builder()
            .ledger_file(self.ledger.file())
            .price_source(self.price.source()?)
            .build();
        let poller = Poller::builder()
            .host(&api)
            .statistics(&importer)
            .accumulator(accumulator)
            .device(Device::new(self.instance_id, &self.value_sensor))
            .date_entity_id(self.date_sensor)
            .value_entity_id(self.value_sensor)
            .build();
        let heartbeat = self.heartbeat.client()?;

        poller.start().await;
        if self.once {
            poller.poll().await?;
            heartbeat.send().await;
            return Ok(());
        }
        poller.run(self.polling_interval.into(), &heartbeat).await
    }
}

/// Keeps the ledger in sync with the upstream sensors and the host in sync with the ledger.
#[derive(Builder)]
struct Poller<'a, H, S> {
    host: &'a H,
    statistics: &'a S,
    accumulator: Accumulator,
    device: Device,

    #[builder(into)]
    date_entity_id: String,

    #[builder(into)]
    value_entity_id: String,
}

impl<H: StateSource + SensorSink, S: StatisticsSink> Poller<'_, H, S> {
    /// Replay the stored history into the statistics and publish the initial figures.
    ///
    /// Failures are logged, the poller keeps going without them.
    #[instrument(skip_all, fields(instance_id = %self.device.instance_id))]
    async fn start(&self) {
        info!(
            date_entity_id = %self.date_entity_id,
            value_entity_id = %self.value_entity_id,
            price_entity_id = ?self.accumulator.price_source().entity_id(),
            "starting…",
        );
        let ledger = self.load().await.unwrap_or_else(|error| {
            error!("failed to load the ledger: {error:#}");
            Ledger::default()
        });
        if ledger.is_empty() {
            info!("the ledger is empty, nothing to replay");
        } else {
            let price = self.accumulator.current_price(self.host).await;
            let history = History::replay(ledger.iter(), price);
            info!(n_points = history.len(), %price, "replaying the history…");
            if let Err(error) = self.statistics.import(&history).await {
                error!("failed to replay the history: {error:#}");
            }
        }
        if let Err(error) = self.publish(Local::now().date_naive()).await {
            error!("failed to publish the sensors: {error:#}");
        }
    }

    async fn run(&self, period: Duration, heartbeat: &heartbeat::Client) -> Result {
        let mut interval = interval(period);
        interval.reset_after(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            match self.poll().await {
                Ok(()) => heartbeat.send().await,
                Err(error) => error!("the polling cycle failed: {error:#}"),
            }
        }
    }

    /// Single cycle: fold the current reading into the ledger and refresh the sensors.
    #[instrument(skip_all, fields(instance_id = %self.device.instance_id))]
    async fn poll(&self) -> Result {
        let date_state = self.host.get_state(&self.date_entity_id).await?;
        let value_state = self.host.get_state(&self.value_entity_id).await?;

        match DailyReading::from_states(date_state.as_deref(), value_state.as_deref()) {
            Some(reading) => self.ingest(reading).await?,
            None => debug!(?date_state, ?value_state, "no usable reading"),
        }

        self.publish(Local::now().date_naive()).await
    }

    #[instrument(skip_all, fields(date = %reading.date, value = ?reading.value))]
    async fn ingest(&self, reading: DailyReading) -> Result {
        let accumulator = self.accumulator.clone();
        let ingestion = spawn_blocking(move || accumulator.ingest(reading)).await?;
        match ingestion {
            Ingestion::Appended(total) => {
                info!(?total, "recorded");
                let price = self.accumulator.current_price(self.host).await;
                let history = History::replay([(reading.date, total)], price);
                if let Err(error) = self.statistics.import(&history).await {
                    warn!("failed to push the statistics: {error:#}");
                }
            }
            Ingestion::AlreadyRecorded => debug!("already recorded"),
            Ingestion::Rejected(rejection) => debug!(%rejection, "rejected"),
        }
        Ok(())
    }

    async fn publish(&self, as_of: NaiveDate) -> Result {
        let snapshot = self.accumulator.snapshot(self.host, as_of).await?;
        info!(?snapshot.consumption, ?snapshot.price, ?snapshot.cost, "publishing…");
        for sensor in snapshot.sensors(&self.device) {
            self.host.publish(sensor.as_ref()).await?;
        }
        Ok(())
    }

    async fn load(&self) -> Result<Ledger> {
        let accumulator = self.accumulator.clone();
        Ok(spawn_blocking(move || accumulator.load()).await?)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::{
        host::fake::FakeHost,
        ledger::file::LedgerFile,
        price::PriceSource,
        quantity::{energy::KilowattHours, rate::KilowattHourRate},
        reading::SOURCE_DATE_FORMAT,
    };

    const DATE_SENSOR: &str = "sensor.octopus_reading_date";
    const VALUE_SENSOR: &str = "sensor.octopus_daily_kwh";

    fn poller<'a>(
        host: &'a FakeHost,
        directory: &tempfile::TempDir,
    ) -> Poller<'a, FakeHost, FakeHost> {
        Poller::builder()
            .host(host)
            .statistics(host)
            .accumulator(
                Accumulator::builder()
                    .ledger_file(LedgerFile::new(directory.path().join("ledger.json")))
                    .price_source(PriceSource::Fixed(KilowattHourRate(0.2)))
                    .build(),
            )
            .device(Device::new("main", VALUE_SENSOR))
            .date_entity_id(DATE_SENSOR)
            .value_entity_id(VALUE_SENSOR)
            .build()
    }

    fn today() -> String {
        Local::now().date_naive().format(SOURCE_DATE_FORMAT).to_string()
    }

    #[tokio::test]
    async fn test_start_with_empty_ledger() -> Result {
        let directory = tempfile::tempdir()?;
        let host = FakeHost::default();
        poller(&host, &directory).start().await;

        assert!(host.imported.lock().unwrap().is_empty());
        assert_eq!(host.published_value("sensor.octopus_monthly_energy_main"), Some(0.0));
        assert_eq!(host.published_value("sensor.octopus_monthly_cost_main"), Some(0.0));
        assert_eq!(host.published_value("sensor.octopus_current_price_main"), Some(0.2));
        Ok(())
    }

    #[tokio::test]
    async fn test_start_replays_the_ledger() -> Result {
        let directory = tempfile::tempdir()?;
        let host = FakeHost::default();
        let poller = poller(&host, &directory);
        poller.accumulator.ledger_file().save(&Ledger::from([
            (NaiveDate::from_ymd_opt(2024, 4, 30).unwrap(), KilowattHours(100.0)),
            (NaiveDate::from_ymd_opt(2024, 5, 15).unwrap(), KilowattHours(130.0)),
        ]));

        poller.start().await;

        let imported = host.imported.lock().unwrap();
        assert_eq!(imported.len(), 1);
        assert_eq!(imported[0].len(), 2);
        assert_abs_diff_eq!(imported[0].0[1].cost.0, 26.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_poll_records_the_reading_once() -> Result {
        let directory = tempfile::tempdir()?;
        let host =
            FakeHost::with_states([(DATE_SENSOR, today().as_str()), (VALUE_SENSOR, "12.5")]);
        let poller = poller(&host, &directory);

        poller.poll().await?;
        assert_eq!(host.imported.lock().unwrap().len(), 1);
        assert_eq!(host.published_value("sensor.octopus_monthly_energy_main"), Some(12.5));
        assert_eq!(host.published_value("sensor.octopus_monthly_cost_main"), Some(2.5));

        poller.poll().await?;
        assert_eq!(host.imported.lock().unwrap().len(), 1);
        assert_eq!(poller.accumulator.load().len(), 1);
        assert_eq!(host.published_value("sensor.octopus_monthly_energy_main"), Some(12.5));
        Ok(())
    }

    #[tokio::test]
    async fn test_poll_skips_an_unavailable_reading() -> Result {
        let directory = tempfile::tempdir()?;
        let host =
            FakeHost::with_states([(DATE_SENSOR, today().as_str()), (VALUE_SENSOR, "unavailable")]);
        let poller = poller(&host, &directory);

        poller.poll().await?;
        assert!(poller.accumulator.load().is_empty());
        assert!(host.imported.lock().unwrap().is_empty());
        assert_eq!(host.published_value("sensor.octopus_monthly_energy_main"), Some(0.0));
        Ok(())
    }

    #[tokio::test]
    async fn test_poll_fails_when_the_host_is_unreachable() -> Result {
        let directory = tempfile::tempdir()?;
        let host =
            FakeHost::with_states([(DATE_SENSOR, today().as_str()), (VALUE_SENSOR, "12.5")]);
        let poller = poller(&host, &directory);
        poller.accumulator.ledger_file().save(&Ledger::from([(
            NaiveDate::from_ymd_opt(2024, 4, 30).unwrap(),
            KilowattHours(100.0),
        )]));
        let before = std::fs::read_to_string(poller.accumulator.ledger_file().path())?;

        host.go_offline();
        assert!(poller.poll().await.is_err());

        assert_eq!(std::fs::read_to_string(poller.accumulator.ledger_file().path())?, before);
        assert!(host.published.lock().unwrap().is_empty());
        assert!(host.imported.lock().unwrap().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_poll_rejects_a_spike() -> Result {
        let directory = tempfile::tempdir()?;
        let host =
            FakeHost::with_states([(DATE_SENSOR, today().as_str()), (VALUE_SENSOR, "150.5")]);
        let poller = poller(&host, &directory);

        poller.poll().await?;
        assert!(poller.accumulator.load().is_empty());
        assert!(host.imported.lock().unwrap().is_empty());
        Ok(())
    }
}
