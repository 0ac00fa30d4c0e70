use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use good_lp::clarabel;
use greenhouse_model::greenhouse::LampSchedule;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

use greenhouse_opt::SystemInputs;
use greenhouse_opt::config::ScenarioConfig;
use greenhouse_opt::derive::cop::{compute_cop, read_cop, write_cop};
use greenhouse_opt::derive::heat_load::{HeatLoadModel, read_heating_load, write_heating_load};
use greenhouse_opt::derive::lamp::{
    LampInputs, LampModel, hours_of_year, read_lamp_demand, write_lamp_demand,
};
use greenhouse_opt::derive::solar_prep::{merge_solar, read_solar_clean, write_solar_clean};
use greenhouse_opt::general::weather::{
    load_dwd_solar_raw, load_dwd_solar_w_m2, load_dwd_temperature, load_sun_times,
    load_wind_output,
};
use greenhouse_opt::report;
use greenhouse_opt::systems::{comparison, conventional, future};

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    /// Scenario file (TOML). Without one a built-in preset is used.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,
    /// Preset used when no scenario file is given (baseline, comparison).
    #[arg(long, global = true)]
    preset: Option<String>,
    /// More log output (-v debug, -vv trace).
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Hourly heating load from air temperature and irradiance.
    HeatLoad,
    /// Hourly heat pump COP from air temperature.
    Cop,
    /// Hourly lamp electricity demand.
    Lamp,
    /// Merge two irradiance stations into one gap-free series.
    SolarPrep,
    /// Optimize the conventional grid and gas boiler system.
    Conventional,
    /// Optimize the wind and heat pump system.
    Future,
    /// Optimize both systems and compare their annual costs.
    Compare,
    /// Rotor power at given wind speeds.
    WindPower {
        /// Wind speed in m/s; may be repeated.
        #[arg(long = "speed", default_values_t = [4.0, 8.0, 12.0])]
        speeds: Vec<f64>,
        /// Also summarize the configured turbine output file.
        #[arg(long, default_value_t = false)]
        output_file: bool,
    },
    /// Main investment cost of the configured turbine.
    WindCost,
}

impl Command {
    fn default_preset(&self) -> &'static str {
        match self {
            Self::Compare => "comparison",
            _ => "baseline",
        }
    }
}

fn load_config(cli: &Cli) -> Result<ScenarioConfig> {
    let config = match (&cli.config, &cli.preset) {
        (Some(path), _) => ScenarioConfig::from_toml_file(path)?,
        (None, Some(name)) => ScenarioConfig::from_preset(name)?,
        (None, None) => ScenarioConfig::from_preset(cli.command.default_preset())?,
    };
    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            error!("{e}");
        }
        bail!("{} invalid configuration value(s)", errors.len());
    }
    Ok(config)
}

fn load_inputs(config: &ScenarioConfig, with_future: bool) -> Result<SystemInputs> {
    let data = &config.data;
    let heat = read_heating_load(&data.resolve(&data.heat_load))
        .context("Failed to load heating load; run `heat-load` first")?;
    let electricity = read_lamp_demand(&data.resolve(&data.lamp_demand))
        .context("Failed to load lamp demand; run `lamp` first")?;
    let (cop, wind) = if with_future {
        let cop = read_cop(&data.resolve(&data.cop))
            .context("Failed to load COP; run `cop` first")?;
        let wind = load_wind_output(&data.resolve(&data.wind_output))?.filter_year(data.year);
        (Some(cop), Some(wind))
    } else {
        (None, None)
    };

    let mut inputs = SystemInputs::align(&heat, &electricity, cop.as_ref(), wind.as_ref())?;
    if let Some(hours) = data.horizon_hours {
        inputs.truncate(hours);
        info!("Horizon limited to the first {} hours", inputs.len());
    }
    Ok(inputs)
}

fn run(cli: &Cli, config: &ScenarioConfig) -> Result<()> {
    let data = &config.data;
    let year = Some(data.year);

    match &cli.command {
        Command::HeatLoad => {
            let temperature = load_dwd_temperature(&data.resolve(&data.temperature), year)?;
            let solar = load_dwd_solar_w_m2(&data.resolve(&data.solar_primary), year)?;
            let model = HeatLoadModel::new(config.greenhouse.clone())?;
            let result = model.compute(&temperature, &solar)?;
            write_heating_load(&data.resolve(&data.heat_load), &result)?;
            println!("{}", report::heat_load_report(&result.summary()));
        }
        Command::Cop => {
            let temperature = load_dwd_temperature(&data.resolve(&data.temperature), year)?;
            let result = compute_cop(&config.heat_pump, &temperature);
            write_cop(&data.resolve(&data.cop), &result)?;
            println!("{}", report::cop_report(&result.summary()));
        }
        Command::Lamp => {
            let model = LampModel::new(config.lamps.clone(), config.lamp_schedule.clone())?;
            let hours = hours_of_year(data.year);
            let demand = match config.lamp_schedule {
                LampSchedule::SunriseSunset => {
                    let sun_times = load_sun_times(&data.resolve(&data.sun_times))?;
                    let inputs = LampInputs {
                        sun_times: Some(&sun_times),
                        ..LampInputs::default()
                    };
                    model.compute(&hours, inputs)?
                }
                LampSchedule::DaylightWindow { .. } => {
                    let irradiance = read_solar_clean(&data.resolve(&data.solar_clean))
                        .context("Failed to load merged irradiance; run `solar-prep` first")?;
                    let inputs = LampInputs {
                        irradiance_w_m2: Some(&irradiance),
                        ..LampInputs::default()
                    };
                    model.compute(&hours, inputs)?
                }
            };
            write_lamp_demand(&data.resolve(&data.lamp_demand), &demand)?;
            println!("{}", report::lamp_report(&model.summary(&demand)));
        }
        Command::SolarPrep => {
            let primary = load_dwd_solar_raw(&data.resolve(&data.solar_primary), year)?;
            let fallback = load_dwd_solar_raw(&data.resolve(&data.solar_fallback), year)?;
            let (merged, stats) = merge_solar(&primary, &fallback)?;
            write_solar_clean(&data.resolve(&data.solar_clean), &merged)?;
            println!("{}", report::solar_merge_report(&stats));
        }
        Command::Conventional => {
            let inputs = load_inputs(config, false)?;
            println!("{}", report::input_overview(&inputs.overview()));
            let (_, summary) = conventional::run(&inputs, &config.conventional, clarabel)?;
            println!("{}", report::conventional_report(&summary));
        }
        Command::Future => {
            let inputs = load_inputs(config, true)?;
            println!("{}", report::input_overview(&inputs.overview()));
            let (_, summary) = future::run(&inputs, &config.future, clarabel)?;
            println!("{}", report::future_report(&summary));
        }
        Command::Compare => {
            let inputs = load_inputs(config, true)?;
            println!("{}", report::input_overview(&inputs.overview()));
            let outcome =
                comparison::compare(&inputs, &config.conventional, &config.future, clarabel)?;
            println!("{}", report::conventional_report(&outcome.conventional));
            println!("{}", report::future_report(&outcome.future));
            println!("{}", report::comparison_report(&outcome.comparison));
        }
        Command::WindPower {
            speeds,
            output_file,
        } => {
            println!("{}", report::wind_power_report(&config.rotor, speeds));
            if *output_file {
                let output =
                    load_wind_output(&data.resolve(&data.wind_output))?.filter_year(data.year);
                println!(
                    "{}",
                    report::wind_output_report(&output, config.future.wind.nameplate_kw)
                );
            }
        }
        Command::WindCost => {
            let cost = config.turbine_cost.main_investment_cost()?;
            println!("{}", report::wind_cost_report(&config.turbine_cost, &cost));
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    let config = load_config(&cli)?;
    run(&cli, &config)
}
