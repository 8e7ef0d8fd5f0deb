use crate::command::MissionCmd;
use crate::mission::submission::{MissionPlan, SubMission, Telemetry};
use crate::mission::task_name::TaskName;
use crate::status::*;

///发布机器人位置
fn loc(value: String) -> Telemetry {
    Telemetry::Msg {
        topic: ROBOT_LOCATION_TOPIC,
        field: ROBOT_LOCATION_FIELD,
        value,
    }
}

///发布机器人状态
fn status(value: &'static str) -> Telemetry {
    Telemetry::Msg {
        topic: ROBOT_STATUS_TOPIC,
        field: ROBOT_STATUS_FIELD,
        value: value.to_owned(),
    }
}

///发布舱门开关
fn door(open: bool) -> Telemetry {
    Telemetry::Bool {
        topic: DOOR_CONTROL_TOPIC,
        field: DOOR_CONTROL_FIELD,
        value: open,
    }
}

fn bed_location(bed_id: u32) -> String {
    format!("{}{}", LOCATION_BED_PREFIX, bed_id)
}

///把指令按当前状态展开成任务计划
///这里只生成计划,不改状态也不下发任务;前置状态不满足返回Precondition错误
pub fn build_plan(
    cmd: MissionCmd,
    state: RobotState,
    bed_id: u32,
) -> Result<MissionPlan, MissionError> {
    let plan = match cmd {
        MissionCmd::Dock => dock_plan(),
        MissionCmd::Undock => undock_plan(),
        MissionCmd::SelfTest => self_test_plan(),
        MissionCmd::Deliver => {
            if state != RobotState::Standby {
                return Err(MissionError::Precondition(
                    "Robot not standby at parking".to_owned(),
                ));
            }
            deliver_plan(bed_id)
        }
        MissionCmd::Collect => {
            if state != RobotState::Idle {
                return Err(MissionError::Precondition(
                    "Robot not idle at parking".to_owned(),
                ));
            }
            collect_plan(bed_id)
        }
        MissionCmd::Park => {
            if state != RobotState::Charging {
                return Err(MissionError::Precondition(
                    "Robot not at Charger".to_owned(),
                ));
            }
            park_plan()
        }
        MissionCmd::DoorOpen => MissionPlan::new(Vec::new()).publish(door(DOOR_OPEN)),
        MissionCmd::DoorClose => MissionPlan::new(Vec::new()).publish(door(DOOR_CLOSE)),
        MissionCmd::SafetyOn => MissionPlan::new(vec![SubMission::new(TaskName::SafetyOn)
            .describe("Turn ON Obstacle Guard")])
        .publish(status(ROBOT_STATUS_IDLE)),
        MissionCmd::SafetyOff => MissionPlan::new(vec![SubMission::new(TaskName::SafetyOff)
            .fallback(TaskName::SafetyOn)
            .describe("Turn OFF Obstacle Guard")])
        .publish(status(ROBOT_STATUS_IDLE)),
        MissionCmd::GripperExtend => gripper_plan(
            SubMission::new(TaskName::GripperExtend)
                .fallback(TaskName::GripperRetract)
                .describe("Gripper Extend"),
        ),
        MissionCmd::GripperRetract => {
            gripper_plan(SubMission::new(TaskName::GripperRetract).describe("Gripper Retract"))
        }
        MissionCmd::GripperClamp => {
            gripper_plan(SubMission::new(TaskName::GripperClamp).describe("Gripper Clamp"))
        }
        MissionCmd::GripperRelease => {
            gripper_plan(SubMission::new(TaskName::GripperRelease).describe("Gripper Release"))
        }
        MissionCmd::GripperExtendedClamp => gripper_plan(
            SubMission::new(TaskName::GripperExtendedClamp).describe("Gripper Extended Clamp"),
        ),
        MissionCmd::GripperExtendedRelease => gripper_plan(
            SubMission::new(TaskName::GripperExtendedRelease).describe("Gripper Extended Release"),
        ),
        // enable/disable/shutdown/cancel_mission不走计划,由CommandProcessor直接处理
        MissionCmd::Enable | MissionCmd::Disable | MissionCmd::Shutdown | MissionCmd::CancelMission => {
            return Err(MissionError::UnknownCommand(cmd.tag().to_owned()));
        }
    };
    Ok(plan)
}

///夹爪类指令都是单任务计划,成功后把状态遥测发回idle
fn gripper_plan(sub: SubMission) -> MissionPlan {
    MissionPlan::new(vec![sub]).publish(status(ROBOT_STATUS_IDLE))
}

fn dock_plan() -> MissionPlan {
    MissionPlan::new(vec![
        SubMission::new(TaskName::SafetyOff)
            .fallback(TaskName::SafetyOn)
            .describe("Turn OFF Obstacle Guard"),
        // 对桩偶尔一次不中,允许自动重发一次
        SubMission::new(TaskName::Dock)
            .retry_limit(2)
            .describe("Dock to Robot charger"),
    ])
    .success_state(RobotState::Charging)
    .publish(status(ROBOT_STATUS_CHARGING))
    .publish(loc(LOCATION_CHARGER.to_owned()))
}

fn undock_plan() -> MissionPlan {
    MissionPlan::new(vec![SubMission::new(TaskName::Undock)
        .fallback(TaskName::Dock)
        .describe("Undock From Charger")])
    .publish(status(ROBOT_STATUS_IDLE))
}

fn self_test_plan() -> MissionPlan {
    MissionPlan::new(vec![
        SubMission::new(TaskName::Undock).describe("Undock From Charger"),
        SubMission::new(TaskName::SafetyOff).describe("Turn OFF Obstacle Guard"),
        SubMission::new(TaskName::Dock).describe("Dock to Robot charger"),
    ])
    .success_state(RobotState::Charging)
    .publish(status(ROBOT_STATUS_CHARGING))
}

fn deliver_plan(bed_id: u32) -> MissionPlan {
    MissionPlan::new(vec![
        SubMission::new(TaskName::SafetyOn)
            .fallback(TaskName::SafetyOff)
            .describe("Turn ON Obstacle Guard"),
        SubMission::new(TaskName::LfParkingExit)
            .fallback(TaskName::LfHallwayToParking)
            .describe("Exit Parking Location")
            .publish(loc(LOCATION_HALLWAY.to_owned())),
        SubMission::new(TaskName::LfHallwayToBed(bed_id))
            .fallback(TaskName::LfBedToHallway(bed_id))
            .describe("Go to Bed Location")
            .publish(loc(bed_location(bed_id))),
        SubMission::new(TaskName::ReleaseToBed)
            .no_fallback()
            .describe("Release Payload"),
        SubMission::new(TaskName::LfBedToHallway(bed_id))
            .describe("Go back from Bed to Hallway")
            .publish(loc(LOCATION_HALLWAY.to_owned())),
        SubMission::new(TaskName::LfHallwayToParking).describe("Enter Parking Location"),
    ])
    .success_state(RobotState::Idle)
    .publish(status(ROBOT_STATUS_IDLE))
    .publish(loc(LOCATION_PARKING.to_owned()))
}

fn collect_plan(bed_id: u32) -> MissionPlan {
    MissionPlan::new(vec![
        SubMission::new(TaskName::SafetyOn).describe("Turn ON Obstacle Guard"),
        SubMission::new(TaskName::LfParkingExit)
            .fallback(TaskName::LfHallwayToParking)
            .describe("Exit Parking Location")
            .publish(loc(LOCATION_HALLWAY.to_owned())),
        SubMission::new(TaskName::LfHallwayToBed(bed_id))
            .fallback(TaskName::LfBedToHallway(bed_id))
            .describe("Go to Bed Location")
            .publish(loc(bed_location(bed_id))),
        SubMission::new(TaskName::CollectFromBed)
            .fallback(TaskName::ReleaseToBed)
            .describe("Collect Payload"),
        SubMission::new(TaskName::LfBedExit(bed_id)).describe("Clear from Bed location"),
        SubMission::new(TaskName::LfBedToHallway(bed_id))
            .fallback(TaskName::LfHallwayToBed(bed_id))
            .describe("Go back from Bed to Hallway")
            .publish(loc(LOCATION_HALLWAY.to_owned()))
            .publish(door(DOOR_OPEN)),
        SubMission::new(TaskName::LfHallwayToManipulator)
            .no_fallback()
            .describe("Go from Hallway to Manipulator"),
        SubMission::new(TaskName::SafetyOff)
            .fallback(TaskName::SafetyOn)
            .describe("Turn OFF Obstacle Guard")
            .publish(door(DOOR_CLOSE)),
        SubMission::new(TaskName::ReleaseToBed)
            .describe("Handover Payload to Manipulator")
            .publish(loc(LOCATION_MANIPULATOR.to_owned())),
        SubMission::new(TaskName::SafetyOff)
            .fallback(TaskName::SafetyOn)
            .describe("Turn OFF Obstacle Guard"),
        SubMission::new(TaskName::LfManipulatorToCharger)
            .describe("Go from Manipulator to Charger"),
        SubMission::new(TaskName::Dock).describe("Dock to Robot charger"),
    ])
    .success_state(RobotState::Charging)
    .publish(status(ROBOT_STATUS_CHARGING))
    .publish(loc(LOCATION_CHARGER.to_owned()))
}

fn park_plan() -> MissionPlan {
    MissionPlan::new(vec![
        SubMission::new(TaskName::Undock)
            .fallback(TaskName::Dock)
            .describe("Undock From Charger"),
        SubMission::new(TaskName::SafetyOff)
            .fallback(TaskName::SafetyOn)
            .describe("Turn OFF Obstacle Guard"),
        SubMission::new(TaskName::LfChargerToManipulator)
            .fallback(TaskName::LfManipulatorToCharger)
            .describe("Go from Charger to Manipulator"),
        SubMission::new(TaskName::CollectFromManipulator)
            .no_fallback()
            .describe("Collect Payload from Manipulator")
            .publish(loc(LOCATION_MANIPULATOR.to_owned()))
            .publish(door(DOOR_OPEN)),
        SubMission::new(TaskName::SafetyOff)
            .fallback(TaskName::SafetyOn)
            .describe("Turn OFF Obstacle Guard"),
        SubMission::new(TaskName::LfManipulatorToHallway)
            .describe("Go from Manipulator to Hallway")
            .publish(loc(LOCATION_HALLWAY.to_owned())),
        SubMission::new(TaskName::SafetyOn)
            .describe("Turn ON Obstacle Guard")
            .publish(door(DOOR_CLOSE)),
        SubMission::new(TaskName::LfHallwayToParking).describe("Enter Parking Location"),
    ])
    .success_state(RobotState::Standby)
    .publish(status(ROBOT_STATUS_STANDBY))
    .publish(loc(LOCATION_PARKING.to_owned()))
}
