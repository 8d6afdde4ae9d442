//! Constant-velocity Kalman filter over XYAH boxes.
//!
//! State: (cx, cy, aspect, h, vcx, vcy, vaspect, vh). Only the first four
//! components are observed.

use nalgebra::{SMatrix, SVector};

type Vector4 = SVector<f64, 4>;
type Vector8 = SVector<f64, 8>;
type Matrix4 = SMatrix<f64, 4, 4>;
type Matrix8 = SMatrix<f64, 8, 8>;
type Matrix4x8 = SMatrix<f64, 4, 8>;

/// Mean and covariance of one track.
#[derive(Debug, Clone, PartialEq)]
pub struct KalmanState {
    pub mean: Vector8,
    pub covariance: Matrix8,
}

impl KalmanState {
    /// Observed part of the mean as (cx, cy, aspect, h).
    pub fn xyah(&self) -> [f32; 4] {
        [
            self.mean[0] as f32,
            self.mean[1] as f32,
            self.mean[2] as f32,
            self.mean[3] as f32,
        ]
    }
}

#[derive(Debug, Clone)]
pub struct KalmanFilter {
    motion_mat: Matrix8,
    update_mat: Matrix4x8,
    std_weight_position: f64,
    std_weight_velocity: f64,
}

impl Default for KalmanFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl KalmanFilter {
    pub fn new() -> Self {
        let mut motion_mat = Matrix8::identity();
        for i in 0..4 {
            motion_mat[(i, 4 + i)] = 1.0;
        }
        let mut update_mat = Matrix4x8::zeros();
        for i in 0..4 {
            update_mat[(i, i)] = 1.0;
        }

        Self {
            motion_mat,
            update_mat,
            std_weight_position: 1.0 / 20.0,
            std_weight_velocity: 1.0 / 160.0,
        }
    }

    fn position_std(&self, h: f64, scale: f64, aspect_std: f64) -> [f64; 4] {
        let p = scale * self.std_weight_position * h;
        [p, p, aspect_std, p]
    }

    fn velocity_std(&self, h: f64, scale: f64, aspect_std: f64) -> [f64; 4] {
        let v = scale * self.std_weight_velocity * h;
        [v, v, aspect_std, v]
    }

    /// Start a track from an unassociated measurement.
    pub fn initiate(&self, measurement: [f64; 4]) -> KalmanState {
        let mut mean = Vector8::zeros();
        mean.fixed_rows_mut::<4>(0)
            .copy_from(&Vector4::from_row_slice(&measurement));

        let h = measurement[3];
        let pos = self.position_std(h, 2.0, 1e-2);
        let vel = self.velocity_std(h, 10.0, 1e-5);
        let diag: Vector8 = Vector8::from_iterator(pos.into_iter().chain(vel).map(|s| s * s));

        KalmanState {
            mean,
            covariance: Matrix8::from_diagonal(&diag),
        }
    }

    pub fn predict(&self, state: &mut KalmanState) {
        let h = state.mean[3];
        let pos = self.position_std(h, 1.0, 1e-2);
        let vel = self.velocity_std(h, 1.0, 1e-5);
        let diag = Vector8::from_iterator(pos.into_iter().chain(vel).map(|s| s * s));
        let motion_cov = Matrix8::from_diagonal(&diag);

        state.mean = self.motion_mat * state.mean;
        state.covariance = self.motion_mat * state.covariance * self.motion_mat.transpose() + motion_cov;
    }

    /// Project the state into measurement space.
    pub fn project(&self, state: &KalmanState) -> (Vector4, Matrix4) {
        let h = state.mean[3];
        let std = self.position_std(h, 1.0, 1e-1);
        let innovation_cov = Matrix4::from_diagonal(&Vector4::from_iterator(std.map(|s| s * s)));

        let mean = self.update_mat * state.mean;
        let covariance = self.update_mat * state.covariance * self.update_mat.transpose() + innovation_cov;
        (mean, covariance)
    }

    /// Correct the state with a measurement.
    ///
    /// Returns `false` and leaves the state untouched when the projected
    /// covariance is singular.
    pub fn update(&self, state: &mut KalmanState, measurement: [f64; 4]) -> bool {
        let (projected_mean, projected_cov) = self.project(state);
        let Some(projected_inv) = projected_cov.try_inverse() else {
            return false;
        };

        let innovation = Vector4::from_row_slice(&measurement) - projected_mean;
        let kalman_gain = state.covariance * self.update_mat.transpose() * projected_inv;

        state.mean += kalman_gain * innovation;
        state.covariance -= kalman_gain * projected_cov * kalman_gain.transpose();
        true
    }
}
