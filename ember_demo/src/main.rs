//! Boot-menu style demo over the soft device backend
//!
//! Enumerates adapters, initializes the best one, builds the classic
//! textured-quad resources and renders a few paced frames into an
//! offscreen target, then captures the last frame to disk.

use ember_gpu_hal::ember::command::{CommandBufferLevel, IndexType, ScissorRect, Viewport};
use ember_gpu_hal::ember::external::{StdSystemServices, SystemServices};
use ember_gpu_hal::ember::helpers;
use ember_gpu_hal::ember::pipeline::PrimitiveTopology;
use ember_gpu_hal::ember::resource::TextureFormat;
use ember_gpu_hal::ember::shader::ShaderStage;
use ember_gpu_hal::ember::{Result, Session, SessionConfig};
use ember_gpu_hal_device_soft::{print_exec_report, SoftDriver};
use glam::Mat4;

const WIDTH: u32 = 640;
const HEIGHT: u32 = 360;
const FRAME_MICROS: u64 = 16_000; // ~60 FPS pacing

#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
struct MenuVertex {
    position: [f32; 3],
    texcoord: [f32; 2],
    color: u32,
}

fn run() -> Result<()> {
    let config = SessionConfig {
        app_name: "Ember Boot Menu".to_string(),
        debug_level: 2,
        ..SessionConfig::default()
    };
    let mut session = Session::with_config(Box::new(SoftDriver::new()), config);

    for (index, device) in session.enumerate_devices().iter().enumerate() {
        println!(
            "adapter {}: {} {} ({} MiB VRAM)",
            index,
            device.vendor,
            device.device_name,
            device.vram_size / (1024 * 1024)
        );
    }
    session.initialize_best_device()?;

    // Shaders and pipeline
    let vs = session.compile_shader(
        ShaderStage::Vertex,
        helpers::BASIC_VERTEX_SHADER_SOURCE,
        "main",
    )?;
    let fs = session.compile_shader(
        ShaderStage::Fragment,
        helpers::BASIC_FRAGMENT_SHADER_SOURCE,
        "main",
    )?;
    let pipeline = helpers::create_simple_pipeline(
        &mut session,
        vs,
        fs,
        PrimitiveTopology::Triangles,
        TextureFormat::B8G8R8A8_UNORM,
    )?;

    // Menu quad geometry
    let vertices = [
        MenuVertex { position: [-1.0, -1.0, 0.0], texcoord: [0.0, 1.0], color: 0xFFFF_FFFF },
        MenuVertex { position: [1.0, -1.0, 0.0], texcoord: [1.0, 1.0], color: 0xFFFF_FFFF },
        MenuVertex { position: [1.0, 1.0, 0.0], texcoord: [1.0, 0.0], color: 0xFFFF_FFFF },
        MenuVertex { position: [-1.0, 1.0, 0.0], texcoord: [0.0, 0.0], color: 0xFFFF_FFFF },
    ];
    let indices: [u16; 6] = [0, 1, 2, 0, 2, 3];
    let vertex_buffer = helpers::create_vertex_buffer(&mut session, &vertices)?;
    let index_buffer = helpers::create_index_buffer16(&mut session, &indices)?;
    let uniform_buffer = helpers::create_uniform_buffer(&mut session, 64)?;
    helpers::update_uniform_buffer(&mut session, uniform_buffer, &Mat4::IDENTITY.to_cols_array())?;

    // Offscreen target standing in for the scanout surface
    let (target, mut pass) =
        helpers::create_offscreen_render_pass(&mut session, WIDTH, HEIGHT, TextureFormat::B8G8R8A8_UNORM)?;

    let cmd = session.create_command_buffer(CommandBufferLevel::Primary, false)?;
    let system = StdSystemServices;

    for frame in 0..8u32 {
        // Fade the background in over the first frames
        let level = frame as f32 / 7.0;
        pass.clear_color = Some([0.0, 0.0, 0.2 * level, 1.0]);

        session.begin_recording(cmd)?;
        session.begin_render_pass(cmd, pass.clone())?;
        session.set_viewport(cmd, Viewport::full(WIDTH, HEIGHT))?;
        session.set_scissor(cmd, ScissorRect::full(WIDTH, HEIGHT))?;
        session.bind_pipeline(cmd, pipeline)?;
        session.bind_vertex_buffers(cmd, 0, &[vertex_buffer])?;
        session.bind_index_buffer(cmd, index_buffer, 0, IndexType::U16)?;
        session.draw_indexed(cmd, 6, 1, 0, 0, 0)?;
        session.end_render_pass(cmd)?;
        session.end_recording(cmd)?;

        session.submit_command_buffer(cmd)?;
        session.wait_for_completion(cmd)?;

        system.delay(FRAME_MICROS);
    }

    // Capture the final frame; the path is what a console front-end
    // would show the user
    let shot = session.capture_screenshot(target, "boot_menu.raw")?;
    std::fs::write(&shot.path, &shot.data)
        .map_err(|err| ember_gpu_hal::ember::GpuError::Filesystem(err.to_string()))?;
    println!(
        "captured {}x{} {} frame to {}",
        shot.width, shot.height, shot.format, shot.path
    );

    session.wait_idle()?;
    print_exec_report();
    Ok(())
}

fn main() {
    if let Err(err) = run() {
        eprintln!("demo failed: {} (status {})", err, err.status());
        std::process::exit(1);
    }
}
