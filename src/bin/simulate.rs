//! Run the attitude manager against a simulated aircraft.
//!
//! `cargo run --features sim --bin simulate -- [cycles]`

use attitude_manager::attitude::{ChannelCommands, PathCommands, PathMode};
use attitude_manager::error::{PathError, SafetyError, SensorError};
use attitude_manager::hal::{
    AdcChannel, AltitudeReading, Airspeed, AirspeedSensor, FixQuality, GpsFix, ImuReading, Sensors,
};
use attitude_manager::{
    AttitudeConfig, AttitudeManager, PathSource, PidGains, SafetySink, TickDriver,
};
use embedded_time::{clock, duration::Microseconds, rate::Fraction, Clock, Instant};
use nalgebra::Vector3;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

const G: f32 = 9.81;

/// Microseconds since the simulation started.
struct SysClock {
    start: std::time::Instant,
}

impl Clock for SysClock {
    type T = u32;

    const SCALING_FACTOR: Fraction = Fraction::new(1, 1_000_000);

    fn try_now(&self) -> Result<Instant<Self>, clock::Error> {
        Ok(Instant::new(self.start.elapsed().as_micros() as u32))
    }
}

/// A crude fixed-wing model driven directly by the channel commands.
#[derive(Debug, Default)]
struct Plant {
    roll: f32,
    pitch: f32,
    yaw: f32,
    roll_rate: f32,
    pitch_rate: f32,
    yaw_rate: f32,
    airspeed: f32,
    altitude: f32,
    gps_reads: u32,
}

impl Plant {
    fn step(&mut self, channels: &ChannelCommands, dt: f32) {
        self.roll_rate = channels[0] * 0.05;
        self.pitch_rate = channels[1] * 0.05;
        self.yaw_rate = channels[2] * 0.02 + G * self.roll.tan() / self.airspeed.max(5.);

        self.roll += self.roll_rate * dt;
        self.pitch += self.pitch_rate * dt;
        self.yaw = wrap(self.yaw + self.yaw_rate * dt);

        let thrust_speed = channels[3] * 0.3;
        self.airspeed += (thrust_speed - self.airspeed) * 0.5 * dt;
        self.altitude += self.airspeed * self.pitch.sin() * dt;
    }
}

fn wrap(angle: f32) -> f32 {
    use std::f32::consts::PI;
    (angle + PI).rem_euclid(2. * PI) - PI
}

/// The plant's airspeed seen through a 12-bit differential pressure ADC.
struct SimAdc {
    plant: Rc<RefCell<Plant>>,
}

impl AdcChannel for SimAdc {
    type Error = ();

    fn start(&mut self) -> Result<(), ()> {
        Ok(())
    }

    fn poll_for_conversion(&mut self, _timeout_ms: u32) -> Result<(), ()> {
        Ok(())
    }

    fn value(&mut self) -> Result<u32, ()> {
        let airspeed = self.plant.borrow().airspeed;
        let pressure_kpa = 0.5 * 1.2 * airspeed * airspeed / 1000.;
        let raw = (pressure_kpa * 0.2 + 0.5) * 4095.;
        Ok(raw.round().clamp(0., 4095.) as u32)
    }

    fn stop(&mut self) -> Result<(), ()> {
        Ok(())
    }
}

struct SimSensors {
    plant: Rc<RefCell<Plant>>,
    airspeed: Airspeed<SimAdc>,
}

impl Sensors for SimSensors {
    fn imu(&mut self) -> Result<ImuReading, SensorError> {
        let plant = self.plant.borrow();
        let (roll, pitch) = (plant.roll, plant.pitch);

        Ok(ImuReading {
            gyro: Vector3::new(plant.roll_rate, plant.pitch_rate, plant.yaw_rate),
            accel: Vector3::new(
                G * pitch.sin(),
                -G * roll.sin() * pitch.cos(),
                -G * roll.cos() * pitch.cos(),
            ),
        })
    }

    fn airspeed(&mut self) -> Result<f32, SensorError> {
        self.airspeed.read()
    }

    fn altitude(&mut self) -> Result<AltitudeReading, SensorError> {
        Ok(AltitudeReading {
            altitude: self.plant.borrow().altitude,
            temperature: 15.,
        })
    }

    fn gps(&mut self) -> Result<GpsFix, SensorError> {
        let mut plant = self.plant.borrow_mut();
        plant.gps_reads += 1;

        let heading = plant.yaw.to_degrees().rem_euclid(360.);
        Ok(GpsFix {
            ground_speed: plant.airspeed,
            altitude: plant.altitude as i32,
            heading: heading.round() as i16,
            satellites: 9,
            fix_quality: FixQuality::Gps,
            // 5 hz receiver
            is_new: plant.gps_reads % 8 == 0,
            ..GpsFix::default()
        })
    }
}

/// Alternating banked turns at cruise speed.
struct SimPath {
    cycles: u32,
}

impl PathSource for SimPath {
    fn fetch(&mut self) -> Result<PathCommands, PathError> {
        self.cycles += 1;
        let roll = if (self.cycles / 200) % 2 == 0 { 0.2 } else { -0.2 };

        Ok(PathCommands {
            roll,
            pitch: 0.05,
            yaw: 0.,
            airspeed: 16.,
            mode: PathMode::Cruise,
        })
    }
}

struct PlantSink {
    plant: Rc<RefCell<Plant>>,
    dt: f32,
    sent: u32,
}

impl SafetySink for PlantSink {
    fn send(&mut self, channels: &ChannelCommands) -> Result<(), SafetyError> {
        self.plant.borrow_mut().step(channels, self.dt);
        self.sent += 1;

        if self.sent % 40 == 0 {
            let plant = self.plant.borrow();
            println!(
                "{:>5} channels [{:>7.2} {:>7.2} {:>7.2} {:>6.2}] roll {:>6.3} pitch {:>6.3} yaw {:>6.3} airspeed {:>5.2}",
                self.sent,
                channels[0],
                channels[1],
                channels[2],
                channels[3],
                plant.roll,
                plant.pitch,
                plant.yaw,
                plant.airspeed,
            );
        }
        Ok(())
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cycles: u32 = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(800);

    let config = AttitudeConfig::builder()
        .tick_period(Microseconds(5_000))
        .roll_gains(PidGains::new(60., 5., 2., 100., 0.))
        .pitch_gains(PidGains::new(60., 5., 2., 100., 0.))
        .yaw_gains(PidGains::new(10., 0., 0., 100., 0.))
        .airspeed_gains(PidGains::new(8., 2., 0., 100., 0.))
        .build();
    let dt = config.control_period();
    let period = config.tick_period;

    let plant = Rc::new(RefCell::new(Plant {
        airspeed: 15.,
        altitude: 100.,
        ..Plant::default()
    }));
    let sensors = SimSensors {
        plant: plant.clone(),
        airspeed: Airspeed::new(SimAdc {
            plant: plant.clone(),
        }),
    };
    let sink = PlantSink {
        plant: plant.clone(),
        dt,
        sent: 0,
    };

    let mut manager = AttitudeManager::new(config, SimPath { cycles: 0 }, sensors, sink);
    let mut driver = TickDriver::new(
        SysClock {
            start: std::time::Instant::now(),
        },
        period,
    );

    let mut interval = tokio::time::interval(Duration::from_micros(u64::from(period.0)));
    while manager.safety().sent < cycles {
        interval.tick().await;

        match driver.run(&mut manager) {
            Ok(Some(state)) if state.is_fatal() => {
                println!("fatal failure: {:?}", manager.fault());
                break;
            }
            Ok(_) => {}
            Err(error) => {
                eprintln!("tick driver: {}", error);
                break;
            }
        }
    }

    println!(
        "{} cycles, {} dropped, {} overruns",
        manager.safety().sent,
        manager.dropped_cycles(),
        driver.overruns()
    );
}
