use mission_sim::sim::presets;
use mission_sim::types::{format_get, SimConfig, Simulation};

fn main() {
    env_logger::init();

    // -----------------------------------------------------------------------
    // Mission: Aurora LEO shakedown (185 km circular, one SPS burn)
    // -----------------------------------------------------------------------
    let mission = presets::leo_shakedown();
    let name = mission.name.clone();
    let mut sim = Simulation::new(mission, SimConfig::default()).expect("preset dataset is valid");

    let initial = sim.snapshot();

    // -----------------------------------------------------------------------
    // Run to GET 000:25:00
    // -----------------------------------------------------------------------
    let summary = sim.run_until(1_500.0);
    let last = sim.snapshot();

    // -----------------------------------------------------------------------
    // Print results
    // -----------------------------------------------------------------------
    println!();
    println!("====================================================================");
    println!("  MISSION SIMULATION — {}", name);
    println!("====================================================================");
    println!();
    println!("  Initial Orbit");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  Altitude:      {:>8.1} km    Velocity:     {:>8.1} m/s",
        initial.orbit.altitude_m / 1_000.0,
        initial.orbit.speed_mps
    );
    println!(
        "  Period:        {:>8.0} s     Eccentricity: {:>8.5}",
        initial.orbit.figures.period_s, initial.orbit.figures.eccentricity
    );
    println!();

    println!("  Mission Events");
    println!("  ──────────────────────────────────────────────────────────────────");
    for event in &last.events {
        println!("  {:<28} {:<12} {:?}", event.id, event.phase, event.status);
    }
    println!();

    println!("  Burn Reports");
    println!("  ──────────────────────────────────────────────────────────────────");
    for report in &summary.reports {
        println!(
            "  {}  finished {}  [{:?}]",
            report.autopilot_id,
            format_get(report.completed_get_s),
            report.status
        );
        println!(
            "    burn {:>6.2} s   propellant {:>7.1} kg   dv {:>6.1} m/s   ullage {:>4.1} s",
            report.metrics.burn_s,
            report.metrics.propellant_kg,
            report.metrics.delta_v_mps,
            report.metrics.ullage_s
        );
        for check in &report.checks {
            println!(
                "    {:<16} expected {:>8.2}  actual {:>8.2}  dev {:>+7.2}  {}",
                format!("{:?}", check.metric),
                check.expected,
                check.actual,
                check.deviation,
                if check.passed { "PASS" } else { "MISS" }
            );
        }
    }
    println!();

    println!("  Final Orbit");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  Apoapsis:      {:>8.1} km    Periapsis:    {:>8.1} km",
        last.orbit.figures.apoapsis_altitude_m / 1_000.0,
        last.orbit.figures.periapsis_altitude_m / 1_000.0
    );
    println!(
        "  Total dv:      {:>8.1} m/s   GET:          {:>9}",
        summary.total_delta_v_mps, summary.final_get
    );
    println!();

    println!("  Consumables");
    println!("  ──────────────────────────────────────────────────────────────────");
    for tank in &summary.tanks {
        let dv = tank
            .delta_v_mps
            .map(|v| format!("  ({:.0} m/s usable)", v))
            .unwrap_or_default();
        println!(
            "  {:<16} {:>8.1} / {:>8.1}  {:>5.1}%{}{}",
            tank.id,
            tank.quantity,
            tank.capacity,
            tank.fraction * 100.0,
            if tank.below_reserve { "  BELOW RESERVE" } else { "" },
            dv
        );
    }
    println!();

    println!(
        "  Simulation: {} ticks at {} Hz, {} operator actions",
        summary.ticks,
        20,
        sim.action_log().len()
    );
    println!("====================================================================");
    println!();
}
