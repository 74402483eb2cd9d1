use glam::{Mat4, Vec3};

const START_POSITION: Vec3 = Vec3::new(0.0, 0.0, -90.0);
const MOVE_SPEED: f32 = 10.0;
const FAST_MULTIPLIER: f32 = 1.7;
const VERTICAL_FACTOR: f32 = 0.5;
const LOOK_SENSITIVITY: f32 = 0.005;
const TURN_RATE: f32 = 1.0; // radians per second
const PITCH_LIMIT: f32 = 89.0 * std::f32::consts::PI / 180.0;

/// Movement keys currently held down.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MoveInput {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub turn_left: bool,
    pub turn_right: bool,
    pub fast: bool,
}

/// Free-flying camera that starts on the negative z axis looking at the origin.
#[derive(Debug, Clone)]
pub struct Camera {
    position: Vec3,
    yaw: f32,
    pitch: f32,
    fov_y: f32,

    // Mouse drag state for looking around
    mouse_pressed: bool,
    last_mouse_position: [f32; 2],
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

impl Camera {
    pub fn new() -> Self {
        Self {
            position: START_POSITION,
            yaw: 0.0,
            pitch: 0.0,
            fov_y: 60.0_f32.to_radians(),
            mouse_pressed: false,
            last_mouse_position: [0.0, 0.0],
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn forward(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        Vec3::new(cos_pitch * sin_yaw, sin_pitch, cos_pitch * cos_yaw)
    }

    fn right(&self) -> Vec3 {
        self.forward().cross(Vec3::Y).normalize()
    }

    fn up(&self) -> Vec3 {
        self.right().cross(self.forward())
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_to_rh(self.position, self.forward(), Vec3::Y)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, aspect, 0.1, 1000.0)
    }

    /// Move according to the held keys over `dt` seconds.
    pub fn advance(&mut self, input: &MoveInput, dt: f32) {
        let speed = if input.fast {
            MOVE_SPEED * FAST_MULTIPLIER
        } else {
            MOVE_SPEED
        };
        let axis = |positive: bool, negative: bool| positive as i32 as f32 - negative as i32 as f32;
        self.yaw += axis(input.turn_left, input.turn_right) * TURN_RATE * dt;

        let direction = self.forward() * axis(input.forward, input.back)
            + self.right() * axis(input.right, input.left)
            + self.up() * axis(input.up, input.down) * VERTICAL_FACTOR;
        self.position += direction * speed * dt;
    }

    pub fn look(&mut self, delta_x: f32, delta_y: f32) {
        self.yaw -= delta_x * LOOK_SENSITIVITY;
        self.pitch = (self.pitch - delta_y * LOOK_SENSITIVITY).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    pub fn handle_mouse_press(&mut self, position: [f32; 2]) {
        self.mouse_pressed = true;
        self.last_mouse_position = position;
    }

    pub fn handle_mouse_release(&mut self) {
        self.mouse_pressed = false;
    }

    pub fn handle_mouse_move(&mut self, position: [f32; 2]) {
        if self.mouse_pressed {
            let delta_x = position[0] - self.last_mouse_position[0];
            let delta_y = position[1] - self.last_mouse_position[1];
            self.look(delta_x, delta_y);
            self.last_mouse_position = position;
        }
    }

    /// Scrolling moves along the view direction.
    pub fn handle_mouse_wheel(&mut self, delta: f32) {
        self.position += self.forward() * delta * MOVE_SPEED * 0.5;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_looking_at_the_origin() {
        let camera = Camera::new();
        let origin = camera.view_matrix().transform_point3(Vec3::ZERO);
        // Right-handed view space looks down -z
        assert!(origin.x.abs() < 1e-4 && origin.y.abs() < 1e-4);
        assert!((origin.z + 90.0).abs() < 1e-3);
    }

    #[test]
    fn held_keys_move_the_camera() {
        let mut camera = Camera::new();
        camera.advance(
            &MoveInput {
                forward: true,
                ..Default::default()
            },
            1.0,
        );
        assert!((camera.position().z - (-80.0)).abs() < 1e-4);

        camera.advance(
            &MoveInput {
                up: true,
                fast: true,
                ..Default::default()
            },
            1.0,
        );
        assert!((camera.position().y - 8.5).abs() < 1e-4);
    }

    #[test]
    fn turning_left_swings_forward_towards_positive_x() {
        let mut camera = Camera::new();
        camera.advance(
            &MoveInput {
                turn_left: true,
                ..Default::default()
            },
            std::f32::consts::FRAC_PI_2,
        );
        assert!((camera.forward() - Vec3::X).length() < 1e-5);
        assert_eq!(camera.position(), START_POSITION);
    }

    #[test]
    fn pitch_is_clamped() {
        let mut camera = Camera::new();
        camera.look(0.0, -1.0e6);
        assert!(camera.forward().y > 0.99);
        assert!(camera.view_matrix().is_finite());

        camera.reset();
        assert_eq!(camera.position(), START_POSITION);
    }
}
