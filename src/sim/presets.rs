//! Canned mission datasets for the demo binary and scenario tests.

use crate::autopilot::pad::{AbortPolicy, BurnPad, Expected};
use crate::autopilot::script::{AutopilotDef, DskyEntry, Step, TimedStep, UllageBinding};
use crate::craft::{CraftDef, EngineParams};
use crate::events::event::{EffectPayload, EventDef};
use crate::orbital::body;
use crate::rcs::cluster::{CraftRcs, RcsCluster, Thruster, TorqueAxis, TranslationAxis};
use crate::rcs::controller::PulseSelector;
use crate::resources::tank::{TankDef, TankKind};
use crate::sim::runner::{InitialOrbit, MissionDef};

fn rcs_thruster(id: String, axis: TranslationAxis, torque: Vec<TorqueAxis>) -> Thruster {
    Thruster {
        id,
        translation_axis: axis,
        torque_axes: torque,
        thrust_n: 445.0,
        isp_s: 280.0,
        min_impulse_s: 0.012,
        max_duty_cycle: 0.9,
    }
}

fn service_module_rcs() -> CraftRcs {
    // Four quads at 90° spacing; fore/aft pair per quad with paired
    // torque authority
    let torque_pairs = [
        (TorqueAxis::PitchUp, TorqueAxis::PitchDown),
        (TorqueAxis::YawLeft, TorqueAxis::YawRight),
        (TorqueAxis::PitchDown, TorqueAxis::PitchUp),
        (TorqueAxis::YawRight, TorqueAxis::YawLeft),
    ];
    let clusters = torque_pairs
        .iter()
        .enumerate()
        .map(|(i, (fwd_torque, aft_torque))| {
            let quad = (b'a' + i as u8) as char;
            RcsCluster {
                id: format!("quad_{}", quad),
                radius_m: 2.1,
                angle_deg: 90.0 * i as f64,
                axial_offset_m: 0.65,
                thrusters: vec![
                    rcs_thruster(
                        format!("q{}_fwd", quad),
                        TranslationAxis::XPlus,
                        vec![*fwd_torque],
                    ),
                    rcs_thruster(
                        format!("q{}_aft", quad),
                        TranslationAxis::XMinus,
                        vec![*aft_torque],
                    ),
                ],
            }
        })
        .collect();

    CraftRcs {
        craft_id: "aurora_csm".into(),
        tank_id: "sm_rcs".into(),
        clusters,
    }
}

fn orbit_raise_autopilot() -> AutopilotDef {
    AutopilotDef {
        id: "ap_orbit_raise".into(),
        craft_id: "aurora_csm".into(),
        tank_id: "sps_propellant".into(),
        ullage: Some(UllageBinding {
            tank_id: "sm_rcs".into(),
            flow_kg_s: 0.45,
        }),
        steps: vec![
            TimedStep {
                start_s: 0.0,
                duration_s: 0.0,
                step: Step::AttitudeHold {
                    roll: 0.0,
                    pitch: 2.5,
                    yaw: 0.0,
                },
            },
            TimedStep {
                start_s: 1.0,
                duration_s: 0.0,
                step: Step::RcsPulse {
                    selector: PulseSelector::Torque(TorqueAxis::PitchUp),
                    duration_s: 0.2,
                    count: 1,
                    duty_cycle: 1.0,
                },
            },
            TimedStep {
                start_s: 2.0,
                duration_s: 4.0,
                step: Step::UllageFire,
            },
            TimedStep {
                start_s: 6.0,
                duration_s: 20.0,
                step: Step::Throttle { level: 1.0 },
            },
            TimedStep {
                start_s: 26.0,
                duration_s: 2.0,
                step: Step::ThrottleRamp { from: 1.0, to: 0.0 },
            },
            TimedStep {
                start_s: 28.5,
                duration_s: 0.0,
                step: Step::Dsky {
                    entry: DskyEntry {
                        verb: Some(82),
                        noun: None,
                        program: None,
                        registers: vec![],
                        sequence: vec![],
                        macro_name: Some("orbit_params_request".into()),
                    },
                },
            },
        ],
        pad: Some(BurnPad {
            delivery_get_s: Some(120.0),
            valid_until_get_s: Some(2_000.0),
            tig_get_s: Some(306.0),
            attitude: None,
            notes: Some("SPS-1 orbit raise, prograde".into()),
            burn_s: Some(Expected::with_abs(22.0, 1.0)),
            propellant_kg: Some(Expected::with_pct(622.0, 5.0)),
            delta_v_mps: Some(Expected::with_pct(142.0, 5.0)),
            ullage_s: Some(Expected::with_abs(4.0, 0.5)),
            ullage_kg: Some(Expected::with_abs(1.8, 0.3)),
        }),
        abort_policy: AbortPolicy::default(),
    }
}

/// Low Earth orbit shakedown: one checklist, one PAD-checked SPS burn,
/// one post-burn report. Starts in a 185 km circular orbit.
pub fn leo_shakedown() -> MissionDef {
    MissionDef {
        name: "Aurora LEO Shakedown".into(),
        body: body::presets::earth(),
        initial_orbit: InitialOrbit::Circular {
            altitude_m: 185_000.0,
        },
        crafts: vec![CraftDef {
            id: "aurora_csm".into(),
            name: "Aurora CSM".into(),
            dry_mass_kg: 11_500.0,
            engine: EngineParams {
                thrust_n: 91_190.0,
                isp_s: 314.0,
            },
            tanks: vec![
                "sps_propellant".into(),
                "sm_rcs".into(),
                "o2_supply".into(),
                "fuel_cell".into(),
            ],
        }],
        tanks: vec![
            TankDef::propellant("sps_propellant", 2_000.0, 1_800.0)
                .with_reserve(0.08)
                .with_dv_reference(314.0, 12_000.0),
            TankDef::propellant("sm_rcs", 300.0, 300.0).with_reserve(0.15),
            TankDef {
                id: "o2_supply".into(),
                kind: TankKind::LifeSupport,
                capacity: 200.0,
                initial: 200.0,
                reserve_fraction: 0.2,
                ambient_rate: 0.002,
                dv_reference: None,
            },
            TankDef {
                id: "fuel_cell".into(),
                kind: TankKind::Power,
                capacity: 120.0,
                initial: 120.0,
                reserve_fraction: 0.25,
                ambient_rate: 1.2 / 3_600.0, // 1.2 kW continuous bus load
                dv_reference: None,
            },
        ],
        rcs: vec![service_module_rcs()],
        autopilots: vec![orbit_raise_autopilot()],
        events: vec![
            EventDef {
                id: "ascent_config_checklist".into(),
                phase: "earth_orbit".into(),
                craft_id: "aurora_csm".into(),
                open_get_s: Some(60.0),
                close_get_s: Some(600.0),
                autopilot_id: None,
                checklist_id: Some("cl_ascent_config".into()),
                prerequisites: vec![],
                success_effects: EffectPayload::default(),
                failure_effects: EffectPayload::default(),
            },
            EventDef {
                id: "orbit_raise_burn".into(),
                phase: "earth_orbit".into(),
                craft_id: "aurora_csm".into(),
                open_get_s: Some(300.0),
                close_get_s: Some(2_000.0),
                autopilot_id: Some("ap_orbit_raise".into()),
                checklist_id: None,
                prerequisites: vec!["ascent_config_checklist".into()],
                success_effects: EffectPayload::default(),
                failure_effects: EffectPayload {
                    resource_deltas: vec![],
                    comms_blackout: Some(true),
                    breadcrumb: Some("SPS-1 off-nominal, holding attitude".into()),
                },
            },
            EventDef {
                id: "post_burn_status_report".into(),
                phase: "earth_orbit".into(),
                craft_id: "aurora_csm".into(),
                open_get_s: None,
                close_get_s: None,
                autopilot_id: None,
                checklist_id: Some("cl_post_burn".into()),
                prerequisites: vec!["orbit_raise_burn".into()],
                success_effects: EffectPayload::default(),
                failure_effects: EffectPayload::default(),
            },
        ],
    }
}
