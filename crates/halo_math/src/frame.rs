use crate::Vec3;

/// Build a tangent and bitangent perpendicular to the unit normal `n`.
///
/// The tangent is taken from whichever of the x/z components dominates so the
/// cross product never collapses. Returns `(tangent, bitangent)`.
pub fn tangent_frame(n: Vec3) -> (Vec3, Vec3) {
    let tangent = if n.x.abs() > n.z.abs() {
        Vec3::new(-n.y, n.x, 0.0)
    } else {
        Vec3::new(0.0, -n.z, n.y)
    };
    let tangent = tangent.normalize();
    let bitangent = n.cross(tangent);
    (tangent, bitangent)
}
