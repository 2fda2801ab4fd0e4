use panorama::{
    AssetError, HeadlessBackend, PanoramaConfig, PanoramaError, PanoramaImage, PanoramaRenderer,
    PendingTexture, StaticTextureLoader, SurfaceFault, TextureLoader, Viewport,
};

fn test_image() -> PanoramaImage {
    PanoramaImage::from_rgba8(3, 2, vec![200; 3 * 2 * 4]).expect("valid image")
}

fn mounted(loader: &dyn TextureLoader) -> (PanoramaRenderer<HeadlessBackend>, panorama::HeadlessStatsHandle) {
    let backend = HeadlessBackend::new();
    let stats = backend.stats_handle();
    let mut renderer = PanoramaRenderer::new(backend, PanoramaConfig::default());
    renderer
        .mount(Viewport::new(800.0, 600.0, 1.0), loader)
        .expect("mount succeeds");
    (renderer, stats)
}

/// Loader whose result never arrives while the test holds the sender.
struct StalledLoader(std::cell::RefCell<Vec<crossbeam_channel::Sender<Result<PanoramaImage, AssetError>>>>);

impl TextureLoader for StalledLoader {
    fn load(&self) -> PendingTexture {
        let (sender, pending) = PendingTexture::channel();
        self.0.borrow_mut().push(sender);
        pending
    }
}

#[test]
fn mount_builds_every_resource_and_requests_a_frame() {
    let (renderer, stats) = mounted(&StaticTextureLoader::with_image(test_image()));
    let resources = renderer.resources().expect("mounted");

    assert!(renderer.frame_pending());
    assert_eq!(resources.camera().field_of_view(), 75.0);
    assert_eq!(resources.camera().aspect(), 800.0 / 600.0);
    assert!(resources.geometry().is_inverted());
    assert_eq!(resources.geometry().radius(), 500.0);
    assert!(resources.mesh().inverted);
    assert!(resources.texture().placeholder);
    assert!(!resources.texture().sampling.generate_mipmaps);
    assert_eq!(resources.material().texture_id, resources.texture().id);
    assert_eq!(resources.material().presentation.blur, 4.0);

    let snapshot = stats.snapshot();
    assert_eq!(snapshot.live, 4);
    assert_eq!(snapshot.backing_size, Some((800, 600)));
}

#[test]
fn ready_fires_once_on_the_frame_after_the_first_draw() {
    let (mut renderer, stats) = mounted(&StaticTextureLoader::with_image(test_image()));

    let first = renderer.frame();
    assert!(first.drawn);
    assert!(!first.ready);

    let second = renderer.frame();
    assert!(second.drawn);
    assert!(second.ready);

    for _ in 0..5 {
        assert!(!renderer.frame().ready);
    }
    let snapshot = stats.snapshot();
    assert_eq!(snapshot.draws, 7);
    assert_eq!(snapshot.uploads, 1);
    assert!(!renderer.resources().expect("mounted").texture().placeholder);
}

#[test]
fn ready_fires_even_when_the_texture_fails() {
    let (mut renderer, stats) = mounted(&StaticTextureLoader::missing());

    assert!(!renderer.frame().ready);
    assert!(renderer.frame().ready);
    assert_eq!(stats.snapshot().uploads, 0);
    assert!(renderer.resources().expect("mounted").texture().placeholder);
}

#[test]
fn rotation_advances_by_a_fixed_step_per_frame() {
    let (mut renderer, stats) = mounted(&StaticTextureLoader::missing());
    for _ in 0..10 {
        renderer.frame();
    }
    let rotation = renderer.resources().expect("mounted").scene().rotation_y();
    assert!((rotation - 0.006).abs() < 1e-6, "rotation {rotation}");

    let drawn = stats.snapshot().last_rotation.expect("model matrix drawn");
    assert!(drawn.abs_diff_eq(glam::Mat4::from_rotation_y(0.006), 1e-5));
}

#[test]
fn texture_uploads_when_the_load_completes_late() {
    let loader = StalledLoader(Default::default());
    let (mut renderer, stats) = mounted(&loader);
    renderer.frame();
    renderer.frame();
    assert_eq!(stats.snapshot().uploads, 0);

    let sender = loader.0.borrow_mut().pop().expect("load started");
    sender.send(Ok(test_image())).expect("renderer still listening");
    renderer.frame();

    let snapshot = stats.snapshot();
    assert_eq!(snapshot.uploads, 1);
    let resources = renderer.resources().expect("mounted");
    assert_eq!(resources.material().revision, 1);
    assert_eq!(resources.texture().width, 3);
}

#[test]
fn resize_updates_camera_and_backing_buffer_only() {
    let (mut renderer, stats) = mounted(&StaticTextureLoader::with_image(test_image()));
    renderer.frame();
    let (mesh_id, texture_id, material_id) = {
        let resources = renderer.resources().expect("mounted");
        (
            resources.mesh().id,
            resources.texture().id,
            resources.material().id,
        )
    };

    renderer.resize(Viewport::new(1280.0, 720.0, 2.0));

    let resources = renderer.resources().expect("mounted");
    assert_eq!(resources.camera().aspect(), 1280.0 / 720.0);
    assert_eq!(
        (resources.surface().width, resources.surface().height),
        (2560, 1440)
    );
    assert_eq!(resources.mesh().id, mesh_id);
    assert_eq!(resources.texture().id, texture_id);
    assert_eq!(resources.material().id, material_id);

    let snapshot = stats.snapshot();
    assert_eq!(snapshot.backing_size, Some((2560, 1440)));
    assert_eq!(snapshot.meshes_created, 1);
    assert_eq!(snapshot.textures_created, 1);
    assert_eq!(snapshot.materials_created, 1);
}

#[test]
fn resize_before_mount_is_a_no_op() {
    let backend = HeadlessBackend::new();
    let stats = backend.stats_handle();
    let mut renderer = PanoramaRenderer::new(backend, PanoramaConfig::default());
    renderer.resize(Viewport::new(640.0, 480.0, 1.0));
    assert!(!renderer.is_mounted());
    assert_eq!(stats.snapshot().backing_size, None);
}

#[test]
fn unmount_releases_everything_and_stops_drawing() {
    let (mut renderer, stats) = mounted(&StaticTextureLoader::with_image(test_image()));
    renderer.frame();
    renderer.unmount();
    renderer.unmount();

    assert!(!renderer.is_mounted());
    assert!(!renderer.frame_pending());
    let draws = stats.snapshot().draws;
    for _ in 0..10 {
        let report = renderer.frame();
        assert!(!report.drawn);
        assert!(!report.ready);
    }
    let snapshot = stats.snapshot();
    assert_eq!(snapshot.draws, draws);
    assert_eq!(snapshot.live, 0);
}

#[test]
fn unmount_abandons_an_in_flight_texture_load() {
    let loader = StalledLoader(Default::default());
    let (mut renderer, _stats) = mounted(&loader);
    renderer.unmount();

    let sender = loader.0.borrow_mut().pop().expect("load started");
    assert!(sender.send(Ok(test_image())).is_err());
}

#[test]
fn remount_releases_the_previous_set() {
    let loader = StaticTextureLoader::missing();
    let (mut renderer, stats) = mounted(&loader);
    renderer.frame();
    renderer.frame();
    renderer
        .mount(Viewport::new(400.0, 400.0, 1.0), &loader)
        .expect("remount");

    let snapshot = stats.snapshot();
    assert_eq!(snapshot.surfaces_created, 2);
    assert_eq!(snapshot.live, 4);
    // Ready is reported again for the new mount.
    assert!(!renderer.frame().ready);
    assert!(renderer.frame().ready);
}

#[test]
fn context_failure_leaves_nothing_allocated() {
    let backend = HeadlessBackend::without_context();
    let stats = backend.stats_handle();
    let mut renderer = PanoramaRenderer::new(backend, PanoramaConfig::default());
    let err = renderer
        .mount(Viewport::new(800.0, 600.0, 1.0), &StaticTextureLoader::missing())
        .err()
        .expect("mount fails");

    assert!(matches!(err, PanoramaError::ContextUnavailable(_)));
    assert!(!renderer.is_mounted());
    assert!(!renderer.frame_pending());
    assert!(!renderer.frame().ready);
    assert_eq!(stats.snapshot().live, 0);
}

#[test]
fn empty_viewport_is_rejected_at_mount() {
    let mut renderer = PanoramaRenderer::new(HeadlessBackend::new(), PanoramaConfig::default());
    let err = renderer
        .mount(Viewport::new(0.0, 600.0, 1.0), &StaticTextureLoader::missing())
        .err()
        .expect("mount fails");
    assert!(matches!(err, PanoramaError::EmptyViewport { .. }));
}

#[test]
fn lost_surface_is_reconfigured_and_drawing_resumes() {
    let mut backend = HeadlessBackend::new();
    backend.inject_faults([SurfaceFault::Lost]);
    let stats = backend.stats_handle();
    let mut renderer = PanoramaRenderer::new(backend, PanoramaConfig::default());
    renderer
        .mount(Viewport::new(320.0, 200.0, 1.0), &StaticTextureLoader::missing())
        .expect("mount");

    let failed = renderer.frame();
    assert!(!failed.drawn);
    assert!(renderer.frame_pending());

    let first = renderer.frame();
    assert!(first.drawn);
    assert!(!first.ready);
    assert!(renderer.frame().ready);
    assert_eq!(stats.snapshot().draws, 2);
}

#[test]
fn dropping_the_renderer_releases_resources() {
    let (renderer, stats) = mounted(&StaticTextureLoader::missing());
    drop(renderer);
    assert_eq!(stats.snapshot().live, 0);
}
