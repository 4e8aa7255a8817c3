//! Integration tests for the command-buffer workflow through the
//! public Session API


use ember_gpu_hal::ember::command::{CommandBufferLevel, CommandBufferState, IndexType};
use ember_gpu_hal::ember::helpers;
use ember_gpu_hal::ember::pipeline::PrimitiveTopology;
use ember_gpu_hal::ember::resource::TextureFormat;
use ember_gpu_hal::ember::shader::ShaderStage;
use ember_gpu_hal::ember::{GpuError, Session};
use hal_test_utils::initialized_session;

struct FrameFixture {
    session: Session,
    pipeline: ember_gpu_hal::ember::pipeline::PipelineId,
    pass: ember_gpu_hal::ember::command::RenderPassDesc,
    vertex_buffer: ember_gpu_hal::ember::resource::BufferId,
    index_buffer: ember_gpu_hal::ember::resource::BufferId,
}

fn frame_fixture() -> FrameFixture {
    let mut session = initialized_session();
    let vs = session
        .compile_shader(ShaderStage::Vertex, "void main() {}", "main")
        .unwrap();
    let fs = session
        .compile_shader(ShaderStage::Fragment, "void main() {}", "main")
        .unwrap();
    let pipeline = helpers::create_simple_pipeline(
        &mut session,
        vs,
        fs,
        PrimitiveTopology::Triangles,
        TextureFormat::R8G8B8A8_UNORM,
    )
    .unwrap();
    let (_, pass) =
        helpers::create_offscreen_render_pass(&mut session, 16, 16, TextureFormat::R8G8B8A8_UNORM)
            .unwrap();
    let vertices: [f32; 12] = [
        -0.5, -0.5, 0.0, 0.5, -0.5, 0.0, 0.5, 0.5, 0.0, -0.5, 0.5, 0.0,
    ];
    let vertex_buffer = helpers::create_vertex_buffer(&mut session, &vertices).unwrap();
    let indices: [u16; 6] = [0, 1, 2, 0, 2, 3];
    let index_buffer = helpers::create_index_buffer16(&mut session, &indices).unwrap();
    FrameFixture {
        session,
        pipeline,
        pass,
        vertex_buffer,
        index_buffer,
    }
}

// ============================================================================
// SPEC SCENARIOS
// ============================================================================

#[test]
fn test_integration_draw_indexed_requires_render_pass() {
    let mut fx = frame_fixture();
    let cb = fx
        .session
        .create_command_buffer(CommandBufferLevel::Primary, false)
        .unwrap();
    fx.session.begin_recording(cb).unwrap();

    // Outside a render pass: DeviceError
    let result = fx.session.draw_indexed(cb, 6, 1, 0, 0, 0);
    assert!(matches!(result.unwrap_err(), GpuError::DeviceError(_)));

    // Wrapped in begin/end render pass: succeeds
    fx.session.begin_render_pass(cb, fx.pass.clone()).unwrap();
    fx.session.bind_pipeline(cb, fx.pipeline).unwrap();
    fx.session
        .bind_vertex_buffers(cb, 0, &[fx.vertex_buffer])
        .unwrap();
    fx.session
        .bind_index_buffer(cb, fx.index_buffer, 0, IndexType::U16)
        .unwrap();
    fx.session.draw_indexed(cb, 6, 1, 0, 0, 0).unwrap();
    fx.session.end_render_pass(cb).unwrap();
    fx.session.end_recording(cb).unwrap();
}

#[test]
fn test_integration_calls_outside_recording_never_mutate() {
    let mut fx = frame_fixture();
    let cb = fx
        .session
        .create_command_buffer(CommandBufferLevel::Primary, false)
        .unwrap();

    // Before begin_recording
    let result = fx.session.insert_barrier(cb);
    assert!(matches!(result.unwrap_err(), GpuError::DeviceError(_)));

    fx.session.begin_recording(cb).unwrap();
    fx.session.insert_barrier(cb).unwrap();
    fx.session.end_recording(cb).unwrap();
    let recorded = fx.session.command_buffer(cb).unwrap().commands().len();

    // After end_recording
    let result = fx.session.insert_barrier(cb);
    assert!(matches!(result.unwrap_err(), GpuError::DeviceError(_)));
    assert_eq!(
        fx.session.command_buffer(cb).unwrap().commands().len(),
        recorded
    );
}

#[test]
fn test_integration_state_machine_transitions() {
    let mut fx = frame_fixture();
    let cb = fx
        .session
        .create_command_buffer(CommandBufferLevel::Primary, false)
        .unwrap();
    let state = |session: &Session| session.command_buffer(cb).unwrap().state();

    assert_eq!(state(&fx.session), CommandBufferState::Initial);
    fx.session.begin_recording(cb).unwrap();
    assert_eq!(state(&fx.session), CommandBufferState::Recording);
    fx.session.end_recording(cb).unwrap();
    assert_eq!(state(&fx.session), CommandBufferState::Executable);
    fx.session.submit_command_buffer(cb).unwrap();
    assert_eq!(state(&fx.session), CommandBufferState::Submitted);
    fx.session.wait_for_completion(cb).unwrap();
    assert_eq!(state(&fx.session), CommandBufferState::Completed);

    // Completed buffers are recordable again
    fx.session.begin_recording(cb).unwrap();
    assert_eq!(state(&fx.session), CommandBufferState::Recording);
}

#[test]
fn test_integration_submit_requires_executable() {
    let mut fx = frame_fixture();
    let cb = fx
        .session
        .create_command_buffer(CommandBufferLevel::Primary, false)
        .unwrap();

    let result = fx.session.submit_command_buffer(cb);
    assert!(matches!(result.unwrap_err(), GpuError::DeviceError(_)));

    fx.session.begin_recording(cb).unwrap();
    let result = fx.session.submit_command_buffer(cb);
    assert!(matches!(result.unwrap_err(), GpuError::DeviceError(_)));
}

#[test]
fn test_integration_secondary_buffers_record_but_never_submit() {
    let mut fx = frame_fixture();
    let cb = fx
        .session
        .create_command_buffer(CommandBufferLevel::Secondary, false)
        .unwrap();
    fx.session.begin_recording(cb).unwrap();
    fx.session.insert_barrier(cb).unwrap();
    fx.session.end_recording(cb).unwrap();

    let result = fx.session.submit_command_buffer(cb);
    assert!(matches!(result.unwrap_err(), GpuError::DeviceError(_)));
}

#[test]
fn test_integration_mapped_buffer_blocks_submission() {
    let mut fx = frame_fixture();
    // A host-visible buffer bound as vertex input
    let staging = fx
        .session
        .allocate_buffer(
            64,
            ember_gpu_hal::ember::resource::BufferUsage::VERTEX
                | ember_gpu_hal::ember::resource::BufferUsage::DYNAMIC,
        )
        .unwrap();

    let cb = fx
        .session
        .create_command_buffer(CommandBufferLevel::Primary, false)
        .unwrap();
    fx.session.begin_recording(cb).unwrap();
    fx.session.begin_render_pass(cb, fx.pass.clone()).unwrap();
    fx.session.bind_pipeline(cb, fx.pipeline).unwrap();
    fx.session.bind_vertex_buffers(cb, 0, &[staging]).unwrap();
    fx.session.draw(cb, 3, 1, 0, 0).unwrap();
    fx.session.end_render_pass(cb).unwrap();
    fx.session.end_recording(cb).unwrap();

    fx.session.map_buffer(staging).unwrap();
    let result = fx.session.submit_command_buffer(cb);
    assert!(matches!(result.unwrap_err(), GpuError::DeviceError(_)));

    fx.session.unmap_buffer(staging).unwrap();
    fx.session.submit_command_buffer(cb).unwrap();
    fx.session.wait_for_completion(cb).unwrap();
}

#[test]
fn test_integration_wait_for_completion_requires_submitted() {
    let mut fx = frame_fixture();
    let cb = fx
        .session
        .create_command_buffer(CommandBufferLevel::Primary, false)
        .unwrap();
    let result = fx.session.wait_for_completion(cb);
    assert!(matches!(result.unwrap_err(), GpuError::DeviceError(_)));
}

#[test]
fn test_integration_destroy_command_buffer_waits_for_flight() {
    let mut fx = frame_fixture();
    let cb = fx
        .session
        .create_command_buffer(CommandBufferLevel::Primary, false)
        .unwrap();
    fx.session.begin_recording(cb).unwrap();
    fx.session.end_recording(cb).unwrap();
    fx.session.submit_command_buffer(cb).unwrap();

    let result = fx.session.destroy_command_buffer(cb);
    assert!(matches!(result.unwrap_err(), GpuError::DeviceError(_)));

    fx.session.wait_for_completion(cb).unwrap();
    fx.session.destroy_command_buffer(cb).unwrap();
    assert!(fx.session.command_buffer(cb).is_none());
}
