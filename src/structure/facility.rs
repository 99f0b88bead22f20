use super::primitives::{generate_cylinder_points, generate_frame_points, generate_line_points, sample_count};
use super::{ensure_density, ensure_non_negative, ensure_positive, DelaySchedule, FogVolume, StructurePoints, SubAssembly, Subsystem};
use crate::error::ConfigError;
use crate::sampler::Sampler;
use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// First module's reveal start; later modules follow across `FACILITY_SPREAD`.
const FACILITY_START: f32 = 0.15;
const FACILITY_SPREAD: f32 = 0.25;
const MODULE_SPAN: f32 = 0.06;
const MODULE_JITTER: f32 = 0.04;

const SKID_HEIGHT: f32 = 0.6;
const STACK_RADIUS: f32 = 0.5;

/// One piece of surface equipment. Every `center` is the ground-level
/// center of the module's footprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FacilityModule {
    /// Open mud tank with two agitators.
    Tank { center: Vec3, size: Vec3 },
    /// Horizontal pump barrel along x on a low skid.
    Pump { center: Vec3, radius: f32, length: f32 },
    /// Engine housing with a vertical exhaust stack.
    PowerUnit { center: Vec3, size: Vec3, stack_height: f32 },
}

impl FacilityModule {
    fn validate(&self) -> Result<(), ConfigError> {
        match self {
            FacilityModule::Tank { size, .. } => {
                ensure_positive("facility.tank.size.x", size.x)?;
                ensure_positive("facility.tank.size.y", size.y)?;
                ensure_positive("facility.tank.size.z", size.z)
            }
            FacilityModule::Pump { radius, length, .. } => {
                ensure_positive("facility.pump.radius", *radius)?;
                ensure_positive("facility.pump.length", *length)
            }
            FacilityModule::PowerUnit { size, stack_height, .. } => {
                ensure_positive("facility.power_unit.size.x", size.x)?;
                ensure_positive("facility.power_unit.size.y", size.y)?;
                ensure_positive("facility.power_unit.size.z", size.z)?;
                ensure_non_negative("facility.power_unit.stack_height", *stack_height)
            }
        }
    }

    /// Emit the module's points: housing in the first half of the schedule,
    /// fittings in the second.
    fn generate<R: Rng>(
        &self,
        density: f32,
        jitter: f32,
        schedule: &DelaySchedule,
        sampler: &mut Sampler<R>,
        out: &mut StructurePoints,
    ) {
        let housing = schedule.slice(0.0, 0.5);
        let fittings = schedule.slice(0.5, 1.0);

        match *self {
            FacilityModule::Tank { center, size } => {
                let frame = generate_frame_points(size.x, size.y, size.z, center, density, jitter, sampler);
                out.extend_along(frame, &housing, 0.0, 1.0, sampler);

                let top = center.y + size.y;
                for side in [-0.25, 0.25] {
                    let x = center.x + size.x * side;
                    let shaft = generate_line_points(
                        Vec3::new(x, top, center.z),
                        Vec3::new(x, center.y + size.y * 0.3, center.z),
                        density,
                        jitter,
                        sampler,
                    );
                    out.extend_along(shaft, &fittings, 0.0, 1.0, sampler);
                }
                let walkway = generate_line_points(
                    Vec3::new(center.x - size.x * 0.5, top, center.z),
                    Vec3::new(center.x + size.x * 0.5, top, center.z),
                    density,
                    jitter,
                    sampler,
                );
                out.extend_at(walkway, &fittings, 0.0, sampler);
            }
            FacilityModule::Pump { center, radius, length } => {
                let skid = generate_frame_points(
                    length + 1.0,
                    SKID_HEIGHT,
                    radius * 2.0 + SKID_HEIGHT,
                    center,
                    density,
                    jitter,
                    sampler,
                );
                out.extend_along(skid, &housing, 0.0, 1.0, sampler);

                let rings = sample_count(length * density, 0, 2);
                let barrel = generate_cylinder_points(
                    center + Vec3::new(-length * 0.5, SKID_HEIGHT + radius, 0.0),
                    Vec3::X,
                    length,
                    radius,
                    rings,
                    12,
                    jitter,
                    sampler,
                );
                out.extend_along(barrel, &fittings, 0.0, 1.0, sampler);
            }
            FacilityModule::PowerUnit { center, size, stack_height } => {
                let frame = generate_frame_points(size.x, size.y, size.z, center, density, jitter, sampler);
                out.extend_along(frame, &housing, 0.0, 1.0, sampler);

                if stack_height > 0.0 {
                    let rings = sample_count(stack_height * density, 0, 2);
                    let stack = generate_cylinder_points(
                        center + Vec3::new(size.x * 0.3, size.y, 0.0),
                        Vec3::Y,
                        stack_height,
                        STACK_RADIUS,
                        rings,
                        8,
                        jitter,
                        sampler,
                    );
                    out.extend_by(stack, &fittings, sampler, |p| (p.y - center.y - size.y) / stack_height);
                }
            }
        }
    }
}

/// Surface equipment around the rig: mud tanks, pumps and power units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FacilityParams {
    /// Modules in reveal order.
    pub modules: Vec<FacilityModule>,
    /// Points per unit length.
    pub density: f32,
    /// Per-axis position jitter.
    pub jitter: f32,
    /// Dispersed starting volume.
    pub fog: FogVolume,
}

impl Default for FacilityParams {
    fn default() -> Self {
        let tank = Vec3::new(8.0, 4.0, 5.0);
        let power = Vec3::new(10.0, 5.0, 6.0);
        Self {
            modules: vec![
                FacilityModule::Tank { center: Vec3::new(-22.0, 0.0, -4.0), size: tank },
                FacilityModule::Tank { center: Vec3::new(-12.0, 0.0, -4.0), size: tank },
                FacilityModule::Tank { center: Vec3::new(-2.0, 0.0, -4.0), size: tank },
                FacilityModule::Pump { center: Vec3::new(-16.0, 0.0, 8.0), radius: 1.2, length: 6.0 },
                FacilityModule::Pump { center: Vec3::new(-6.0, 0.0, 8.0), radius: 1.2, length: 6.0 },
                FacilityModule::PowerUnit { center: Vec3::new(48.0, 0.0, -4.0), size: power, stack_height: 6.0 },
                FacilityModule::PowerUnit { center: Vec3::new(62.0, 0.0, -4.0), size: power, stack_height: 6.0 },
            ],
            density: 2.0,
            jitter: 0.05,
            fog: FogVolume::new(Vec3::new(20.0, 5.0, 0.0), 45.0),
        }
    }
}

impl SubAssembly for FacilityParams {
    fn subsystem(&self) -> Subsystem {
        Subsystem::Facility
    }

    fn fog(&self) -> FogVolume {
        self.fog
    }

    fn validate(&self) -> Result<(), ConfigError> {
        ensure_density("facility.density", self.density)?;
        ensure_non_negative("facility.jitter", self.jitter)?;
        ensure_non_negative("facility.fog.radius", self.fog.radius)?;
        self.modules.iter().try_for_each(FacilityModule::validate)
    }

    fn generate<R: Rng>(&self, sampler: &mut Sampler<R>) -> StructurePoints {
        let mut out = StructurePoints::new();
        let count = self.modules.len().max(1) as f32;
        for (i, module) in self.modules.iter().enumerate() {
            let schedule = DelaySchedule::new(
                FACILITY_START + FACILITY_SPREAD * i as f32 / count,
                MODULE_SPAN,
                MODULE_JITTER,
            );
            module.generate(self.density, self.jitter, &schedule, sampler, &mut out);
        }
        out
    }
}
