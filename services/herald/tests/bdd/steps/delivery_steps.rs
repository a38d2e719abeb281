//! BDD step definitions for delivery failure handling

use cucumber::given;

use crate::world::HeraldWorld;

#[given(expr = "the endpoint {string} never answers")]
fn endpoint_hangs(world: &mut HeraldWorld, url: String) {
    world.http.hang_on(&url);
}

#[given(expr = "the endpoint {string} responds with status {int}")]
fn endpoint_status(world: &mut HeraldWorld, url: String, status: u16) {
    world.http.respond_with(&url, status);
}
