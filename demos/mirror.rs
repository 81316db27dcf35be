use easel::prelude::*;
use log::info;

fn main() -> Result<()> {
    env_logger::init();

    let mut scene = Scene::new();

    // Overlay layer holding the shapes that follow the abstract group
    let overlay = scene.create_layer(NodeConfig {
        name: "overlay".into(),
        ..Default::default()
    });

    // Content layer: a rotated, scaled abstract group
    let content = scene.create_layer(NodeConfig {
        name: "content".into(),
        ..Default::default()
    });
    let mirror = scene.create_abstract_group(NodeConfig {
        name: "mirror".into(),
        x: 200.0,
        y: 120.0,
        rotation: 30.0,
        scale_x: 1.5,
        scale_y: 1.5,
        ..Default::default()
    });
    scene.add(content, mirror)?;

    let handles: Vec<NodeId> = (0..3)
        .map(|i| {
            scene.create_shape(NodeConfig {
                name: format!("handle-{i}"),
                x: i as f32 * 40.0,
                width: 10.0,
                height: 10.0,
                ..Default::default()
            })
        })
        .collect();

    // Parentless shapes are duplicated into the group and linked back
    scene.abstract_group(mirror)?.add_all(handles.iter().copied())?;
    for &handle in &handles {
        scene.add(overlay, handle)?;
    }

    let mut ctx = PaintContext::new();
    while scene.needs_draw() {
        scene.batch_draw(&mut ctx)?;
    }

    for command in ctx.commands() {
        let (x, y) = command.transform.transform_point(0.0, 0.0);
        info!(
            "{} painted at ({:.1}, {:.1}) size {:.1}x{:.1}",
            scene.name(command.node)?,
            x,
            y,
            command.width,
            command.height
        );
    }

    for &handle in &handles {
        let attrs = scene.attrs(handle)?;
        info!(
            "{} mirrors to x={:.1} y={:.1} w={:.1} h={:.1} rotation={:.1}",
            scene.name(handle)?,
            attrs.x,
            attrs.y,
            attrs.width,
            attrs.height,
            attrs.rotation
        );
    }

    Ok(())
}
