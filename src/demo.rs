use glam::Vec3;
use scene3d::{Camera, ModelKind, NodeId, Polyhedron, Result, Scene};

pub struct DemoState {
    pub scene: Scene,
    pub root: NodeId,
    cart: NodeId,
    wheels: Vec<NodeId>,
    camera_rig: NodeId,
    spinner: NodeId,
}

impl DemoState {
    pub fn new() -> Result<Self> {
        let mut scene = Scene::new();
        scene.environment.set_background(0.6, 0.8, 1.0, 1.0);

        let ground = scene.add_model(ModelKind::Cube)?;
        scene.set_color(ground, 0.3, 0.6, 0.25)?;
        let ground = scene.add_transform(ground)?;
        scene.set_translation(ground, 0.0, -2.5, 0.0)?;
        scene.set_scale(ground, 6.0, 0.1, 6.0)?;

        let (cart_body, wheels) = Self::build_cart(&mut scene)?;
        let cart = scene.add_transform(cart_body)?;
        scene.set_name(cart, "cart")?;

        let tree = Self::build_tree(&mut scene)?;

        let gem = scene.add_polyhedron(&Polyhedron::icosahedron());
        scene.set_color(gem, 0.95, 0.8, 0.2)?;
        scene.set_line_color(gem, Some(Vec3::new(0.3, 0.2, 0.0)))?;
        let spinner = scene.add_transform(gem)?;
        scene.set_uniform_scale(spinner, 0.3)?;
        let gem = scene.add_transform(spinner)?;
        scene.set_translation(gem, -6.0, 3.0, -4.0)?;

        let lamp = scene.add_light(1)?;
        scene
            .light_mut(lamp)?
            .set_diffuse(0.8, 0.8, 0.7, 1.0)
            .set_position(0.0, 0.0, 0.0, 1.0);
        let lamp = scene.add_transform(lamp)?;
        scene.set_translation(lamp, 4.0, 10.0, 6.0)?;

        let mut camera = Camera::default();
        camera
            .look_at(Vec3::new(0.0, 8.0, 20.0), Vec3::ZERO, Vec3::Y)
            .set_scale(12.0);
        let camera = scene.add_camera(camera);
        let camera_rig = scene.add_transform(camera)?;
        scene.set_name(camera_rig, "camera rig")?;

        let root = scene.add_group([ground, cart, tree, gem, lamp, camera_rig])?;
        scene.set_name(root, "world")?;

        Ok(Self {
            scene,
            root,
            cart,
            wheels,
            camera_rig,
            spinner,
        })
    }

    fn build_cart(scene: &mut Scene) -> Result<(NodeId, Vec<NodeId>)> {
        let body = scene.add_model(ModelKind::Cube)?;
        scene.set_color(body, 0.8, 0.1, 0.1)?;
        scene.set_line_color(body, Some(Vec3::ZERO))?;
        let body = scene.add_transform(body)?;
        scene.set_scale(body, 1.5, 0.5, 0.8)?;

        let mut parts = vec![body];
        let mut wheels = Vec::new();

        for (x, z) in [(-1.6, -1.3), (1.6, -1.3), (-1.6, 1.3), (1.6, 1.3)] {
            let tire = scene.add_model(ModelKind::Torus)?;
            scene.set_color(tire, 0.15, 0.15, 0.15)?;
            let hub = scene.add_model(ModelKind::Cylinder)?;
            scene.set_color(hub, 0.7, 0.7, 0.7)?;
            let hub = scene.add_transform(hub)?;
            scene.set_scale(hub, 0.6, 0.15, 0.2)?;

            // The hub bar makes the spin visible
            let spinning = scene.add_group([tire, hub])?;
            let wheel = scene.add_transform(spinning)?;
            scene.set_uniform_scale(wheel, 0.5)?;

            let placed = scene.add_transform(wheel)?;
            scene.set_translation(placed, x, -1.0, z)?;

            wheels.push(wheel);
            parts.push(placed);
        }

        Ok((scene.add_group(parts)?, wheels))
    }

    fn build_tree(scene: &mut Scene) -> Result<NodeId> {
        let crown = scene.add_model(ModelKind::Cone)?;
        scene.set_color(crown, 0.1, 0.5, 0.15)?;
        let crown = scene.add_transform(crown)?;
        scene.set_translation(crown, 0.0, 1.5, 0.0)?;
        scene.set_rotation(crown, -90.0, Vec3::X)?;

        let trunk = scene.add_model(ModelKind::Cylinder)?;
        scene.set_color(trunk, 0.45, 0.3, 0.15)?;
        let trunk = scene.add_transform(trunk)?;
        scene.set_rotation(trunk, -90.0, Vec3::X)?;
        scene.set_scale(trunk, 0.3, 0.3, 1.0)?;

        let tree = scene.add_group([crown, trunk])?;
        let tree = scene.add_transform(tree)?;
        scene.set_translation(tree, 6.0, -1.0, -5.0)?;

        Ok(tree)
    }

    pub fn update(&mut self, time: f32) -> Result<()> {
        let distance = (time * 0.5).sin() * 4.0;
        self.scene.set_translation(self.cart, distance, 0.0, 0.0)?;

        // Rolling without slipping: wheel radius is 0.75 after model scaling
        let wheel_angle = -(distance / 0.75).to_degrees();
        for &wheel in &self.wheels {
            self.scene.set_rotation(wheel, wheel_angle, Vec3::Z)?;
        }

        self.scene
            .set_rotation(self.spinner, time * 45.0, Vec3::new(1.0, 1.0, 0.0))?;
        self.scene
            .set_rotation(self.camera_rig, time * 10.0, Vec3::Y)?;

        Ok(())
    }
}
