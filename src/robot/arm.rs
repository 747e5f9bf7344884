//! Arm update throttling.
//!
//! Moving all three arm servos in the same tick browns out the radio, so
//! each tick moves at most two of them, picking the joints that are furthest
//! from their commanded angle.

use super::hardware::ServoChannel;
use crate::wire::protocol::{BASE_HOME, GRIP_HOME, LIFT_HOME};

/// Servo transition time for per-frame arm updates (ms)
pub const ARM_TRANSITION_MS: u32 = 100;

/// Servo transition time when homing the arm (ms)
pub const HOME_TRANSITION_MS: u32 = 500;

/// Last angles sent to the arm servos
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArmShadow {
    pub base: i32,
    pub lift: i32,
    pub grip: i32,
}

impl ArmShadow {
    /// Rest pose
    pub fn home() -> Self {
        Self {
            base: BASE_HOME,
            lift: LIFT_HOME,
            grip: GRIP_HOME,
        }
    }

    /// Record the updates that were sent
    pub fn apply(&mut self, plan: &ArmPlan) {
        for update in plan.iter() {
            match update.channel {
                ServoChannel::Base => self.base = update.angle,
                ServoChannel::Lift => self.lift = update.angle,
                ServoChannel::Grip => self.grip = update.angle,
            }
        }
    }
}

impl Default for ArmShadow {
    fn default() -> Self {
        Self::home()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServoUpdate {
    pub channel: ServoChannel,
    pub angle: i32,
}

/// Servo updates for one tick, in base, lift, grip order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArmPlan {
    updates: [Option<ServoUpdate>; 2],
}

impl ArmPlan {
    fn push(&mut self, update: ServoUpdate) {
        if let Some(slot) = self.updates.iter_mut().find(|slot| slot.is_none()) {
            *slot = Some(update);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ServoUpdate> {
        self.updates.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Choose which servos to move this tick.
///
/// - base moves whenever it changed
/// - lift moves when it changed and either base did not, or lift is at
///   least as far off as grip
/// - grip moves when it changed and either base did not, or grip is
///   strictly further off than lift
///
/// With all three changed, base plus the larger of lift and grip move; the
/// joint left behind catches up on a later tick because the shadow still
/// holds its old angle.
pub fn plan_arm_updates(shadow: &ArmShadow, target: &ArmShadow) -> ArmPlan {
    let base_err = (target.base - shadow.base).abs();
    let lift_err = (target.lift - shadow.lift).abs();
    let grip_err = (target.grip - shadow.grip).abs();

    let mut plan = ArmPlan::default();
    if base_err > 0 {
        plan.push(ServoUpdate { channel: ServoChannel::Base, angle: target.base });
    }
    if lift_err > 0 && (base_err == 0 || lift_err >= grip_err) {
        plan.push(ServoUpdate { channel: ServoChannel::Lift, angle: target.lift });
    }
    if grip_err > 0 && (base_err == 0 || grip_err > lift_err) {
        plan.push(ServoUpdate { channel: ServoChannel::Grip, angle: target.grip });
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pose(base: i32, lift: i32, grip: i32) -> ArmShadow {
        ArmShadow { base, lift, grip }
    }

    fn channels(plan: &ArmPlan) -> Vec<ServoChannel> {
        plan.iter().map(|u| u.channel).collect()
    }

    #[test]
    fn test_no_change_no_updates() {
        let plan = plan_arm_updates(&ArmShadow::home(), &ArmShadow::home());
        assert!(plan.is_empty());
    }

    #[test]
    fn test_single_joint_changes() {
        let home = ArmShadow::home();
        assert_eq!(channels(&plan_arm_updates(&home, &pose(92, 100, 120))), vec![ServoChannel::Base]);
        assert_eq!(channels(&plan_arm_updates(&home, &pose(90, 98, 120))), vec![ServoChannel::Lift]);
        assert_eq!(channels(&plan_arm_updates(&home, &pose(90, 100, 110))), vec![ServoChannel::Grip]);
    }

    #[test]
    fn test_lift_and_grip_without_base_both_move() {
        let plan = plan_arm_updates(&ArmShadow::home(), &pose(90, 104, 118));
        assert_eq!(channels(&plan), vec![ServoChannel::Lift, ServoChannel::Grip]);
    }

    #[test]
    fn test_all_three_changed_moves_base_and_larger() {
        let home = ArmShadow::home();

        let plan = plan_arm_updates(&home, &pose(80, 110, 118));
        assert_eq!(channels(&plan), vec![ServoChannel::Base, ServoChannel::Lift]);

        let plan = plan_arm_updates(&home, &pose(80, 102, 130));
        assert_eq!(channels(&plan), vec![ServoChannel::Base, ServoChannel::Grip]);

        // Tie goes to lift
        let plan = plan_arm_updates(&home, &pose(80, 105, 115));
        assert_eq!(channels(&plan), vec![ServoChannel::Base, ServoChannel::Lift]);
    }

    #[test]
    fn test_never_three_updates() {
        let home = ArmShadow::home();
        for base in [0, 45, 90, 135, 180] {
            for lift in (30..=120).step_by(15) {
                for grip in (80..=145).step_by(13) {
                    let plan = plan_arm_updates(&home, &pose(base, lift, grip));
                    assert!(plan.len() <= 2, "{} {} {}", base, lift, grip);
                }
            }
        }
    }

    #[test]
    fn test_lagging_joint_catches_up() {
        let target = pose(80, 110, 118);
        let mut shadow = ArmShadow::home();

        let first = plan_arm_updates(&shadow, &target);
        shadow.apply(&first);
        assert_eq!(shadow, pose(80, 110, 120));

        let second = plan_arm_updates(&shadow, &target);
        assert_eq!(
            second.iter().copied().collect::<Vec<_>>(),
            vec![ServoUpdate { channel: ServoChannel::Grip, angle: 118 }]
        );
        shadow.apply(&second);
        assert_eq!(shadow, target);
    }
}
