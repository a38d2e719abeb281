//! BDD step definitions for payload rendering

use cucumber::{given, then, when};

use herald::render;

use crate::world::HeraldWorld;

#[given(expr = "the payload template {string}")]
fn payload_template(world: &mut HeraldWorld, template: String) {
    world.template = Some(template);
}

#[when(expr = "it is rendered for {string} with summary {string}")]
fn rendered_for(world: &mut HeraldWorld, target: String, summary: String) {
    let template = world.template.as_ref().expect("template not set");
    world.rendered = Some(render::render(template, &target, &summary));
}

#[then(expr = "the payload should be {string}")]
fn payload_is(world: &mut HeraldWorld, expected: String) {
    assert_eq!(world.rendered.as_deref(), Some(expected.as_str()));
}
