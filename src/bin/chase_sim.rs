use bevy::prelude::*;
use chaser::components::{Damage, HealthPool};
use chaser::game_logic::animation::ClipLibrary;
use chaser::game_logic::chaser::{ChaseMode, Chaser, ChaserConfig, ChaserState};
use chaser::game_logic::errors::{ChaseError, ChaseResult};
use chaser::map::RoomLayout;
use chaser::resources::{GameContext, GameSettings};
use clap::Parser;

#[derive(Parser, Clone)]
#[command(name = "chase_sim")]
#[command(about = "Run the chaser headless against a room layout")]
struct Args {
    /// Number of fixed-timestep ticks to simulate
    #[arg(long, default_value = "600")]
    ticks: u32,

    /// Seconds per tick
    #[arg(long, default_value = "0.016666668")]
    dt: f32,

    /// Seed for the chaser's attack choice
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Chase strategy (combat, catch)
    #[arg(long, default_value = "combat")]
    strategy: String,

    /// Layout file relative to layouts/ (.toml or bincode); the bedroom when omitted
    #[arg(long)]
    layout: Option<String>,

    /// Write the layout in use to this file relative to layouts/ and exit
    #[arg(long)]
    write_layout: Option<String>,

    /// Fixed target position (format: X,Y,Z); the layout's player spawn when omitted
    #[arg(long)]
    target: Option<String>,

    /// Print a trace line every N ticks
    #[arg(long, default_value = "30")]
    trace_every: u32,
}

fn parse_strategy(value: &str) -> ChaseResult<ChaseMode> {
    match value {
        "combat" => Ok(ChaseMode::Combat),
        "catch" => Ok(ChaseMode::Catch),
        other => Err(ChaseError::InvalidArgument {
            reason: format!("Unknown strategy '{other}'. Expected combat or catch"),
        }),
    }
}

/// Parse position string "X,Y,Z"
fn parse_position(value: &str) -> ChaseResult<Vec3> {
    let parts: Vec<&str> = value.split(',').collect();
    if parts.len() != 3 {
        return Err(ChaseError::InvalidArgument {
            reason: format!("Invalid position '{value}'. Expected 3 comma-separated values"),
        });
    }

    let mut coords = [0.0_f32; 3];
    for (slot, part) in coords.iter_mut().zip(&parts) {
        *slot = part.trim().parse().map_err(|_| ChaseError::InvalidArgument {
            reason: format!("Invalid position value: '{part}'"),
        })?;
    }
    Ok(Vec3::from_array(coords))
}

fn validate_args(args: &Args) -> ChaseResult<()> {
    if !args.dt.is_finite() || args.dt < 0.0 {
        return Err(ChaseError::InvalidArgument {
            reason: format!("Timestep must be a non-negative number, got {}", args.dt),
        });
    }
    if args.trace_every == 0 {
        return Err(ChaseError::InvalidArgument {
            reason: "--trace-every must be at least 1".to_string(),
        });
    }
    Ok(())
}

fn main() -> ChaseResult<()> {
    let args = Args::parse();
    validate_args(&args)?;

    let layout = match &args.layout {
        Some(path) => RoomLayout::load_from_file(path)?,
        None => RoomLayout::bedroom(),
    };
    println!(
        "Room '{}': {} obstacles, {} moving platforms",
        layout.name,
        layout.obstacles.len(),
        layout.moving_platforms().count()
    );

    if let Some(output) = &args.write_layout {
        let path = layout.save_to_file(output)?;
        println!("Layout written to {}", path.display());
        return Ok(());
    }

    let target = match &args.target {
        Some(value) => parse_position(value)?,
        None => layout.player_spawn,
    };

    let settings = GameSettings {
        chase_mode: parse_strategy(&args.strategy)?,
        chaser_seed: args.seed,
        ..Default::default()
    };
    let mut chaser = Chaser::new(layout.chaser_spawn, ChaserConfig::from(&settings));
    chaser.attach_clips(ClipLibrary::standard())?;

    let mut environment = layout.build_obstacle_manager();
    let context = GameContext::default();
    let damage = Damage::new(settings.chaser_attack_damage.get());
    let mut health = HealthPool::new_full(settings.player_max_health.get());

    println!(
        "Chasing target at {target} with strategy {} for {} ticks of {:.4}s",
        args.strategy, args.ticks, args.dt
    );

    let mut previous_state = chaser.state();
    for tick in 0..args.ticks {
        let elapsed = tick as f32 * args.dt;
        environment.replace_dynamic_obstacles(
            layout
                .moving_platforms()
                .map(|platform| platform.obstacle_at(elapsed)),
        );

        let report = chaser.update(args.dt, target, Some(&environment), &context);

        if let Some(clip) = report.attack_started {
            println!("[{tick:5}] attack '{clip}'");
        }
        if chaser.can_deal_damage() {
            health.take_damage(damage);
            println!("[{tick:5}] hit for {damage}, target health {health}");
        }
        if report.state != previous_state {
            println!("[{tick:5}] {previous_state:?} -> {:?}", report.state);
            previous_state = report.state;
        }
        if tick % args.trace_every == 0 {
            let position = chaser.position();
            println!(
                "[{tick:5}] pos=({:.2}, {:.2}, {:.2}) yaw={:.2} dist={:.2} cooldown={:.2}",
                position.x,
                position.y,
                position.z,
                chaser.yaw(),
                position.distance(target),
                chaser.attack_cooldown()
            );
        }

        if report.caught {
            println!("[{tick:5}] target caught after {:.2}s", elapsed + args.dt);
            break;
        }
        if health.is_dead() {
            println!("[{tick:5}] target defeated after {:.2}s", elapsed + args.dt);
            break;
        }
    }

    chaser.dispose();
    if chaser.state() != ChaserState::Caught && !health.is_dead() {
        println!("Target survived, final health {health}");
    }
    Ok(())
}
