use crate::demo::DemoState;

pub fn update(state: &mut DemoState, time: f32) -> scene3d::Result<()> {
    state.scene.early_update();
    state.update(time)?;
    state.scene.late_update();

    Ok(())
}
