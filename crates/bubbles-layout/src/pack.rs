//! Front-chain circle packing.
//!
//! Circles are placed one at a time tangent to two neighbours on the
//! front chain, skipping ahead whenever the candidate would overlap an
//! already-placed circle. The result is translated so the smallest
//! enclosing circle is centered on the origin.

/// A circle with its center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub x: f64,
    pub y: f64,
    pub r: f64,
}

impl Circle {
    pub fn new(x: f64, y: f64, r: f64) -> Self {
        Self { x, y, r }
    }
}

/// Place `c` tangent to both `a` and `b`.
fn place(b: Circle, a: Circle, c: &mut Circle) {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let d2 = dx * dx + dy * dy;
    if d2 > 0.0 {
        let a2 = (a.r + c.r) * (a.r + c.r);
        let b2 = (b.r + c.r) * (b.r + c.r);
        if a2 > b2 {
            let x = (d2 + b2 - a2) / (2.0 * d2);
            let y = (b2 / d2 - x * x).max(0.0).sqrt();
            c.x = b.x - x * dx - y * dy;
            c.y = b.y - x * dy + y * dx;
        } else {
            let x = (d2 + a2 - b2) / (2.0 * d2);
            let y = (a2 / d2 - x * x).max(0.0).sqrt();
            c.x = a.x + x * dx - y * dy;
            c.y = a.y + x * dy + y * dx;
        }
    } else {
        c.x = a.x + c.r;
        c.y = a.y;
    }
}

fn intersects(a: Circle, b: Circle) -> bool {
    let dr = a.r + b.r - 1e-6;
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    dr > 0.0 && dr * dr > dx * dx + dy * dy
}

/// Index-linked front chain over the circle slice.
struct FrontChain {
    next: Vec<usize>,
    prev: Vec<usize>,
}

impl FrontChain {
    fn link(&mut self, a: usize, b: usize) {
        self.next[a] = b;
        self.prev[b] = a;
    }
}

/// Squared distance from the origin of the weighted midpoint of `a` and
/// its successor.
fn score(circles: &[Circle], chain: &FrontChain, a: usize) -> f64 {
    let a_c = circles[a];
    let b_c = circles[chain.next[a]];
    let ab = a_c.r + b_c.r;
    let dx = (a_c.x * b_c.r + b_c.x * a_c.r) / ab;
    let dy = (a_c.y * b_c.r + b_c.y * a_c.r) / ab;
    dx * dx + dy * dy
}

/// Pack circles in place, returning the enclosing radius.
///
/// Only `r` is read; `x` and `y` are overwritten.
pub fn pack_siblings(circles: &mut [Circle]) -> f64 {
    let n = circles.len();
    if n == 0 {
        return 0.0;
    }

    circles[0].x = 0.0;
    circles[0].y = 0.0;
    if n == 1 {
        return circles[0].r;
    }

    circles[0].x = -circles[1].r;
    circles[1].x = circles[0].r;
    circles[1].y = 0.0;
    if n == 2 {
        return circles[0].r + circles[1].r;
    }

    let (b0, a0) = (circles[1], circles[0]);
    place(b0, a0, &mut circles[2]);

    let mut chain = FrontChain {
        next: vec![0; n],
        prev: vec![0; n],
    };
    let (mut a, mut b) = (0usize, 1usize);
    chain.link(a, b);
    chain.link(b, 2);
    chain.link(2, a);

    let mut i = 3;
    'pack: while i < n {
        let (ca, cb) = (circles[a], circles[b]);
        place(ca, cb, &mut circles[i]);
        let c = i;

        // nearest intersecting circle along the chain, either direction
        let mut j = chain.next[b];
        let mut k = chain.prev[a];
        let mut sj = circles[b].r;
        let mut sk = circles[a].r;
        loop {
            if sj <= sk {
                if intersects(circles[j], circles[c]) {
                    b = j;
                    chain.link(a, b);
                    continue 'pack;
                }
                sj += circles[j].r;
                j = chain.next[j];
            } else {
                if intersects(circles[k], circles[c]) {
                    a = k;
                    chain.link(a, b);
                    continue 'pack;
                }
                sk += circles[k].r;
                k = chain.prev[k];
            }
            if j == chain.next[k] {
                break;
            }
        }

        chain.link(a, c);
        chain.link(c, b);
        b = c;

        let mut best = score(circles, &chain, a);
        let mut cur = chain.next[c];
        while cur != b {
            let s = score(circles, &chain, cur);
            if s < best {
                a = cur;
                best = s;
            }
            cur = chain.next[cur];
        }
        b = chain.next[a];
        i += 1;
    }

    let mut front = vec![circles[b]];
    let mut cur = chain.next[b];
    while cur != b {
        front.push(circles[cur]);
        cur = chain.next[cur];
    }
    let bound = enclose(&front);

    for circle in circles.iter_mut() {
        circle.x -= bound.x;
        circle.y -= bound.y;
    }
    bound.r
}

fn encloses_not(a: Circle, b: Circle) -> bool {
    let dr = a.r - b.r;
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    dr < 0.0 || dr * dr < dx * dx + dy * dy
}

fn encloses_weak(a: Circle, b: Circle) -> bool {
    let dr = a.r - b.r + 1e-6;
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    dr > 0.0 && dr * dr > dx * dx + dy * dy
}

fn encloses_weak_all(a: Circle, basis: &[Circle]) -> bool {
    basis.iter().all(|b| encloses_weak(a, *b))
}

fn enclose_basis2(a: Circle, b: Circle) -> Circle {
    let x21 = b.x - a.x;
    let y21 = b.y - a.y;
    let r21 = b.r - a.r;
    let l = (x21 * x21 + y21 * y21).sqrt();
    Circle::new(
        (a.x + b.x + x21 / l * r21) / 2.0,
        (a.y + b.y + y21 / l * r21) / 2.0,
        (l + a.r + b.r) / 2.0,
    )
}

fn enclose_basis3(a: Circle, b: Circle, c: Circle) -> Circle {
    let (x1, y1, r1) = (a.x, a.y, a.r);
    let (x2, y2, r2) = (b.x, b.y, b.r);
    let (x3, y3, r3) = (c.x, c.y, c.r);
    let a2 = x1 - x2;
    let a3 = x1 - x3;
    let b2 = y1 - y2;
    let b3 = y1 - y3;
    let c2 = r2 - r1;
    let c3 = r3 - r1;
    let d1 = x1 * x1 + y1 * y1 - r1 * r1;
    let d2 = d1 - x2 * x2 - y2 * y2 + r2 * r2;
    let d3 = d1 - x3 * x3 - y3 * y3 + r3 * r3;
    let ab = a3 * b2 - a2 * b3;
    let xa = (b2 * d3 - b3 * d2) / (ab * 2.0) - x1;
    let xb = (b3 * c2 - b2 * c3) / ab;
    let ya = (a3 * d2 - a2 * d3) / (ab * 2.0) - y1;
    let yb = (a2 * c3 - a3 * c2) / ab;
    let qa = xb * xb + yb * yb - 1.0;
    let qb = 2.0 * (r1 + xa * xb + ya * yb);
    let qc = xa * xa + ya * ya - r1 * r1;
    let r = if qa != 0.0 {
        -(qb + (qb * qb - 4.0 * qa * qc).sqrt()) / (2.0 * qa)
    } else {
        -qc / qb
    };
    Circle::new(x1 + xa + xb * r, y1 + ya + yb * r, r)
}

fn enclose_basis(basis: &[Circle]) -> Circle {
    match basis {
        [a] => *a,
        [a, b] => enclose_basis2(*a, *b),
        [a, b, c] => enclose_basis3(*a, *b, *c),
        _ => Circle::new(0.0, 0.0, 0.0),
    }
}

fn extend_basis(basis: &[Circle], p: Circle) -> Option<Vec<Circle>> {
    if encloses_weak_all(p, basis) {
        return Some(vec![p]);
    }

    for &bi in basis {
        if encloses_not(p, bi) && encloses_weak_all(enclose_basis2(bi, p), basis) {
            return Some(vec![bi, p]);
        }
    }

    for (i, &bi) in basis.iter().enumerate() {
        for &bj in &basis[i + 1..] {
            if encloses_not(enclose_basis2(bi, bj), p)
                && encloses_not(enclose_basis2(bi, p), bj)
                && encloses_not(enclose_basis2(bj, p), bi)
                && encloses_weak_all(enclose_basis3(bi, bj, p), basis)
            {
                return Some(vec![bi, bj, p]);
            }
        }
    }
    None
}

/// Loose bound used when the exact basis search degenerates numerically.
fn bounding_circle(circles: &[Circle]) -> Circle {
    let n = circles.len().max(1) as f64;
    let cx = circles.iter().map(|c| c.x).sum::<f64>() / n;
    let cy = circles.iter().map(|c| c.y).sum::<f64>() / n;
    let r = circles
        .iter()
        .map(|c| ((c.x - cx).powi(2) + (c.y - cy).powi(2)).sqrt() + c.r)
        .fold(0.0, f64::max);
    Circle::new(cx, cy, r)
}

/// Smallest circle enclosing every circle (move-to-front basis search).
pub fn enclose(circles: &[Circle]) -> Circle {
    let mut basis: Vec<Circle> = Vec::new();
    let mut current: Option<Circle> = None;
    let mut i = 0;
    while i < circles.len() {
        let p = circles[i];
        match current {
            Some(e) if encloses_weak(e, p) => i += 1,
            _ => match extend_basis(&basis, p) {
                Some(extended) => {
                    basis = extended;
                    current = Some(enclose_basis(&basis));
                    i = 0;
                }
                None => return bounding_circle(circles),
            },
        }
    }
    current.unwrap_or_else(|| bounding_circle(circles))
}

/// Pack circles of the given radii around `center`.
pub fn pack_around(radii: &[f64], center: (f64, f64)) -> Vec<Circle> {
    let mut circles: Vec<Circle> = radii.iter().map(|&r| Circle::new(0.0, 0.0, r)).collect();
    pack_siblings(&mut circles);
    for c in &mut circles {
        c.x += center.0;
        c.y += center.1;
    }
    circles
}

/// Push a packed position away from `center` by `spread`.
pub fn spread_from(center: (f64, f64), packed: Circle, spread: f64) -> (f64, f64) {
    (
        center.0 + (packed.x - center.0) * spread,
        center.1 + (packed.y - center.1) * spread,
    )
}
