//! Vertex relaxation filters for marching-cubes output.
//!
//! All filters move vertex positions only; the face list and vertex count
//! never change. Neighborhoods are the 1-ring over triangle edges.

use serde::{Deserialize, Serialize};

/// Named smoothing scheme applied after surface extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Smoothing {
    None,
    Laplacian,
    Humphrey,
    Taubin,
    MutDifLaplacian,
}

impl Default for Smoothing {
    fn default() -> Self {
        Smoothing::Humphrey
    }
}

// Standard published coefficients.
const HUMPHREY_ALPHA: f64 = 0.1;
const HUMPHREY_BETA: f64 = 0.6;
const TAUBIN_LAMBDA: f64 = 0.5;
const TAUBIN_MU: f64 = -0.53;
const LAPLACIAN_LAMBDA: f64 = 0.5;

/// Applies `kind` for `iterations` rounds, relaxing `vertices` in place.
pub fn smooth(vertices: &mut [[f64; 3]], faces: &[[u32; 3]], kind: Smoothing, iterations: usize) {
    if kind == Smoothing::None || iterations == 0 || vertices.is_empty() {
        return;
    }
    let neighbors = vertex_neighbors(vertices.len(), faces);
    match kind {
        Smoothing::None => {}
        Smoothing::Laplacian => laplacian(vertices, &neighbors, iterations),
        Smoothing::Humphrey => humphrey(vertices, &neighbors, iterations),
        Smoothing::Taubin => taubin(vertices, &neighbors, iterations),
        Smoothing::MutDifLaplacian => mut_dif_laplacian(vertices, &neighbors, iterations),
    }
}

fn vertex_neighbors(n_vertices: usize, faces: &[[u32; 3]]) -> Vec<Vec<u32>> {
    let mut neighbors: Vec<Vec<u32>> = vec![Vec::new(); n_vertices];
    let mut link = |a: u32, b: u32| {
        let list = &mut neighbors[a as usize];
        if !list.contains(&b) {
            list.push(b);
        }
    };
    for f in faces {
        for k in 0..3 {
            let a = f[k];
            let b = f[(k + 1) % 3];
            link(a, b);
            link(b, a);
        }
    }
    neighbors
}

fn neighbor_mean(vertices: &[[f64; 3]], neighbors: &[u32], fallback: [f64; 3]) -> [f64; 3] {
    if neighbors.is_empty() {
        return fallback;
    }
    let mut acc = [0.0; 3];
    for &j in neighbors {
        let v = vertices[j as usize];
        for k in 0..3 {
            acc[k] += v[k];
        }
    }
    let inv = 1.0 / neighbors.len() as f64;
    [acc[0] * inv, acc[1] * inv, acc[2] * inv]
}

// One uniform-weight Laplacian step with step size lambda.
fn laplacian_step(vertices: &mut [[f64; 3]], neighbors: &[Vec<u32>], lambda: f64) {
    let snapshot = vertices.to_vec();
    for (i, v) in vertices.iter_mut().enumerate() {
        let mean = neighbor_mean(&snapshot, &neighbors[i], *v);
        for k in 0..3 {
            v[k] += lambda * (mean[k] - v[k]);
        }
    }
}

fn laplacian(vertices: &mut [[f64; 3]], neighbors: &[Vec<u32>], iterations: usize) {
    for _ in 0..iterations {
        laplacian_step(vertices, neighbors, LAPLACIAN_LAMBDA);
    }
}

// Vollmer/Mencl/Mueller HC smoothing: a Laplacian step followed by a
// correction that pushes vertices back toward a blend of their original
// and previous positions, countering shrinkage.
fn humphrey(vertices: &mut [[f64; 3]], neighbors: &[Vec<u32>], iterations: usize) {
    let original = vertices.to_vec();
    let n = vertices.len();
    let mut b = vec![[0.0f64; 3]; n];

    for _ in 0..iterations {
        let q = vertices.to_vec();
        for i in 0..n {
            let mean = neighbor_mean(&q, &neighbors[i], q[i]);
            vertices[i] = mean;
            for k in 0..3 {
                b[i][k] = mean[k]
                    - (HUMPHREY_ALPHA * original[i][k] + (1.0 - HUMPHREY_ALPHA) * q[i][k]);
            }
        }
        let p = vertices.to_vec();
        for i in 0..n {
            let b_mean = neighbor_mean(&b, &neighbors[i], b[i]);
            for k in 0..3 {
                vertices[i][k] =
                    p[i][k] - (HUMPHREY_BETA * b[i][k] + (1.0 - HUMPHREY_BETA) * b_mean[k]);
            }
        }
    }
}

// Taubin lambda/mu: a shrink step followed by an inflate step per round.
fn taubin(vertices: &mut [[f64; 3]], neighbors: &[Vec<u32>], iterations: usize) {
    for _ in 0..iterations {
        laplacian_step(vertices, neighbors, TAUBIN_LAMBDA);
        laplacian_step(vertices, neighbors, TAUBIN_MU);
    }
}

// Laplacian with a per-vertex diffusion speed that decays as the vertex
// drifts from its original position, so already-displaced vertices slow
// down instead of collapsing flat regions.
fn mut_dif_laplacian(vertices: &mut [[f64; 3]], neighbors: &[Vec<u32>], iterations: usize) {
    let original = vertices.to_vec();
    for _ in 0..iterations {
        let snapshot = vertices.to_vec();
        for (i, v) in vertices.iter_mut().enumerate() {
            let mean = neighbor_mean(&snapshot, &neighbors[i], *v);
            let drift = ((v[0] - original[i][0]).powi(2)
                + (v[1] - original[i][1]).powi(2)
                + (v[2] - original[i][2]).powi(2))
            .sqrt();
            let speed = LAPLACIAN_LAMBDA / (1.0 + drift);
            for k in 0..3 {
                v[k] += speed * (mean[k] - v[k]);
            }
        }
    }
}
