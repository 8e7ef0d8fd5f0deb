use std::fmt;

///原子任务名,每个任务对应data目录下的一个任务文件
///带病床编号的任务在这里拼出完整文件名,不在调用处拼字符串
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum TaskName {
    GripperExtend,
    GripperRetract,
    GripperClamp,
    GripperRelease,
    GripperExtendedClamp,
    GripperExtendedRelease,
    Dock,
    Undock,
    SafetyOn,
    SafetyOff,
    CollectFromBed,
    CollectFromManipulator,
    ReleaseToBed,
    ReleaseToManipulator,
    LfChargerToManipulator,
    LfManipulatorToHallway,
    LfHallwayToParking,
    LfParkingExit,
    LfHallwayToManipulator,
    LfManipulatorToCharger,
    LfHallwayToBed(u32),
    LfBedToHallway(u32),
    LfBedExit(u32),
}

impl TaskName {
    ///任务文件名,相对于data_path,不带.txt后缀
    pub fn file_name(self) -> String {
        match self {
            TaskName::GripperExtend => "gripper/Gripper_extend".to_owned(),
            TaskName::GripperRetract => "gripper/Gripper_retract".to_owned(),
            TaskName::GripperClamp => "gripper/Gripper_clamp".to_owned(),
            TaskName::GripperRelease => "gripper/Gripper_release".to_owned(),
            TaskName::GripperExtendedClamp => "gripper/Gripper_extended_clamp".to_owned(),
            TaskName::GripperExtendedRelease => "gripper/Gripper_extended_release".to_owned(),
            TaskName::Dock => "Dock".to_owned(),
            TaskName::Undock => "Undock".to_owned(),
            TaskName::SafetyOn => "SafetyOn".to_owned(),
            TaskName::SafetyOff => "SafetyOff".to_owned(),
            TaskName::CollectFromBed => "Collect_from_bed".to_owned(),
            TaskName::CollectFromManipulator => "Collect_from_manipulator".to_owned(),
            TaskName::ReleaseToBed => "Release_to_bed".to_owned(),
            TaskName::ReleaseToManipulator => "Release_to_manipulator".to_owned(),
            TaskName::LfChargerToManipulator => "LF_charger_to_manipulator".to_owned(),
            TaskName::LfManipulatorToHallway => "LF_manipulator_to_hallway".to_owned(),
            TaskName::LfHallwayToParking => "LF_hallway_to_parking".to_owned(),
            TaskName::LfParkingExit => "LF_parking_exit".to_owned(),
            TaskName::LfHallwayToManipulator => "LF_hallway_to_manipulator".to_owned(),
            TaskName::LfManipulatorToCharger => "LF_manipulator_to_charger".to_owned(),
            TaskName::LfHallwayToBed(id) => format!("toBeds/LF_hallway_to_bed_{}", id),
            TaskName::LfBedToHallway(id) => format!("fromBeds/LF_bed_to_hallway_{}", id),
            TaskName::LfBedExit(id) => format!("exitBeds/LF_bed_exit_{}", id),
        }
    }
}

impl fmt::Display for TaskName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file_name())
    }
}
